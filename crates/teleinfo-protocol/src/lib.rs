pub mod aggregator;
pub mod checksum;
pub mod codec;
pub mod frame;
pub mod line;
pub mod reassembler;
pub mod tariff;

pub use aggregator::{FinalizedFrame, FrameAggregator, InvalidLineReport};
pub use checksum::{compute, validate};
pub use codec::TicCodec;
pub use frame::Frame;
pub use line::{LineTokenizer, ParsedLine, TokenizedLine};
pub use reassembler::{DrainEvents, FrameReassembler, RawFrame, ReassemblerState, StreamEvent};
pub use tariff::TariffPeriod;
