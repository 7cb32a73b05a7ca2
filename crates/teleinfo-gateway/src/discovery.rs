//! One-time capability announcement.
//!
//! The first frame of a session that carries a meter address (`ADCO`)
//! raises a single [`DiscoveryRequest`]. A collaborator translates it into
//! retained announcement messages so downstream automation platforms create
//! their sensors without manual configuration; [`announcement_messages`]
//! renders that translation for the conventional `<prefix>/<type>/<uid>/config`
//! topic layout.
//!
//! The request fires at most once per session lifetime, even if later
//! frames also carry the identifier.

use crate::config::{DiscoveryConfig, MirrorConfig};
use crate::emission::MirrorMessage;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use teleinfo_core::constants::*;

/// One-shot capability announcement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryRequest {
    /// Meter address (`ADCO` value) of the triggering frame.
    pub device_id: String,

    /// Labels present in the triggering frame.
    pub present: BTreeSet<String>,
}

impl DiscoveryRequest {
    pub fn new(device_id: impl Into<String>, present: impl IntoIterator<Item = String>) -> Self {
        Self {
            device_id: device_id.into(),
            present: present.into_iter().collect(),
        }
    }
}

/// Render the retained announcement messages for one discovery request.
///
/// Announcements are generated only for the labels actually present in the
/// triggering frame. Energy indexes are announced as kWh sensors (the wire
/// carries Wh), with raw Wh variants added when configured.
pub fn announcement_messages(
    discovery: &DiscoveryConfig,
    mirror: &MirrorConfig,
    request: &DiscoveryRequest,
) -> Vec<MirrorMessage> {
    let adco = &request.device_id;
    let availability_topic = format!("{}/ha_avail", mirror.topic_derived);

    let device_name = if discovery.device_name.is_empty() {
        format!("Téléinfo {adco}")
    } else {
        discovery.device_name.clone()
    };
    let device = json!({
        "identifiers": [format!("teleinfo_{adco}")],
        "name": device_name,
        "manufacturer": "Enedis",
        "model": "Linky (TIC historique)",
    });

    let sensor_config = |uid: &str, name: &str, state_topic: String, extra: Value| -> Value {
        let mut config = json!({
            "name": name,
            "unique_id": uid,
            "state_topic": state_topic,
            "availability_topic": availability_topic,
            "payload_available": "online",
            "payload_not_available": "offline",
            "device": device,
        });
        if let (Some(map), Some(extra_map)) = (config.as_object_mut(), extra.as_object()) {
            for (key, value) in extra_map {
                map.insert(key.clone(), value.clone());
            }
        }
        config
    };

    let mut messages = Vec::new();
    let mut announce = |entity_type: &str, uid: String, config: Value| {
        messages.push(MirrorMessage {
            topic: format!("{}/{entity_type}/{uid}/config", discovery.prefix),
            payload: config.to_string(),
            retain: true,
        });
    };

    if request.present.contains(LABEL_PAPP) {
        let uid = format!("teleinfo_{adco}_papp");
        announce(
            "sensor",
            uid.clone(),
            sensor_config(
                &uid,
                "Téléinfo PAPP",
                format!("{}/{LABEL_PAPP}", mirror.topic_fields),
                json!({
                    "unit_of_measurement": "VA",
                    "state_class": "measurement",
                    "icon": "mdi:flash",
                }),
            ),
        );
    }

    for label in [LABEL_IINST, LABEL_IMAX] {
        if request.present.contains(label) {
            let uid = format!("teleinfo_{adco}_{}", label.to_lowercase());
            announce(
                "sensor",
                uid.clone(),
                sensor_config(
                    &uid,
                    &format!("Téléinfo {label}"),
                    format!("{}/{label}", mirror.topic_fields),
                    json!({
                        "unit_of_measurement": "A",
                        "device_class": "current",
                        "state_class": "measurement",
                        "icon": "mdi:current-ac",
                    }),
                ),
            );
        }
    }

    for (label, nice) in [
        (LABEL_BASE, "INDEX BASE"),
        (LABEL_HCHC, "INDEX HCHC"),
        (LABEL_HCHP, "INDEX HCHP"),
    ] {
        if !request.present.contains(label) {
            continue;
        }
        let state_topic = format!("{}/{label}", mirror.topic_fields);
        let uid = format!("teleinfo_{adco}_{}_kwh", label.to_lowercase());
        announce(
            "sensor",
            uid.clone(),
            sensor_config(
                &uid,
                &format!("Téléinfo {nice} (kWh)"),
                state_topic.clone(),
                json!({
                    "unit_of_measurement": "kWh",
                    "device_class": "energy",
                    "state_class": "total_increasing",
                    "value_template": "{{ (value | float(0)) / 1000 }}",
                    "icon": "mdi:counter",
                }),
            ),
        );
        if discovery.include_wh {
            let uid = format!("teleinfo_{adco}_{}_wh", label.to_lowercase());
            announce(
                "sensor",
                uid.clone(),
                sensor_config(
                    &uid,
                    &format!("Téléinfo {nice} (Wh)"),
                    state_topic,
                    json!({
                        "unit_of_measurement": "Wh",
                        "device_class": "energy",
                        "state_class": "total_increasing",
                        "icon": "mdi:counter",
                    }),
                ),
            );
        }
    }

    if request.present.contains(LABEL_PTEC) {
        let uid = format!("teleinfo_{adco}_ptec");
        announce(
            "sensor",
            uid.clone(),
            sensor_config(
                &uid,
                "Téléinfo PTEC",
                format!("{}/{LABEL_PTEC}", mirror.topic_fields),
                json!({"icon": "mdi:clock-outline"}),
            ),
        );
        let uid = format!("teleinfo_{adco}_tarif");
        announce(
            "sensor",
            uid.clone(),
            sensor_config(
                &uid,
                "Téléinfo Tarif courant",
                format!("{}/ptec_friendly", mirror.topic_derived),
                json!({"icon": "mdi:clock-time-four-outline"}),
            ),
        );
        let uid = format!("teleinfo_{adco}_hc_active");
        announce(
            "binary_sensor",
            uid.clone(),
            sensor_config(
                &uid,
                "Téléinfo Heures Creuses",
                format!("{}/hc_active", mirror.topic_derived),
                json!({"icon": "mdi:weather-night"}),
            ),
        );
    }

    // Mark the announced entities available.
    messages.push(MirrorMessage {
        topic: availability_topic,
        payload: "online".to_string(),
        retain: true,
    });

    messages
}
