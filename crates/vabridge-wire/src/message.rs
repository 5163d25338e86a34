//! `StatEvet` body sent to the aggregation sink.
//!
//! Field values are static placeholders from configuration plus the send
//! time; nothing is taken from the inbound alarm yet.

use chrono::Local;
use serde::Serialize;
use vabridge_settings::BodySettings;

use crate::errors::ForwardError;

/// Local time as `YYYYMMDDhhmmss` plus milliseconds (17 digits).
pub fn compact_timestamp() -> String {
    Local::now().format("%Y%m%d%H%M%S%3f").to_string()
}

/// Top-level body object.
#[derive(Clone, Debug, Serialize)]
pub struct ForwardMessage {
    /// The event record.
    #[serde(rename = "StatEvet")]
    pub stat_evet: StatEvent,
}

/// Event record. Field order is the wire order.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct StatEvent {
    pub stat_evet_gd_cd: String,
    pub outb_pos_nm: String,
    pub stat_evet_nm: String,
    pub stat_evet_clr_dtm: String,
    pub stat_evet_actn_rslt: String,
    pub stat_evet_cntn: Vec<String>,
    pub outb_scop_rads: String,
    pub outb_pos: String,
    pub stat_evet_outb_dtm: String,
    pub stat_evet_actn_cntn: String,
    pub proc_st: String,
    #[serde(rename = "uSvcOutbId")]
    pub u_svc_outb_id: String,
    pub stat_evet_item: String,
    pub stat_evet_actn_mn: String,
    pub cpx_rel_evet_outb_seqn_cnt: String,
    pub cpx_rel_evet_outb_seqn: String,
    pub outb_pos_cnt: String,
    pub stat_evet_item_cnt: String,
    pub stat_evet_actn_dtm: String,
    pub stat_evet_id: String,
    pub outb_main_gb: String,
}

impl ForwardMessage {
    /// Build a message from configured values, stamped with `timestamp`.
    pub fn new(body: &BodySettings, timestamp: &str) -> Self {
        Self {
            stat_evet: StatEvent {
                stat_evet_gd_cd: body.grade_code.clone(),
                outb_pos_nm: body.position_name.clone(),
                stat_evet_clr_dtm: timestamp.to_string(),
                stat_evet_cntn: body.content_tags.clone(),
                proc_st: "0".into(),
                u_svc_outb_id: body.service_outbreak_id.clone(),
                cpx_rel_evet_outb_seqn_cnt: "0".into(),
                outb_pos_cnt: "0".into(),
                stat_evet_item_cnt: "0".into(),
                stat_evet_id: body.event_id.clone(),
                ..StatEvent::default()
            },
        }
    }

    /// Compact JSON encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ForwardError> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ORDER: [&str; 21] = [
        "statEvetGdCd",
        "outbPosNm",
        "statEvetNm",
        "statEvetClrDtm",
        "statEvetActnRslt",
        "statEvetCntn",
        "outbScopRads",
        "outbPos",
        "statEvetOutbDtm",
        "statEvetActnCntn",
        "procSt",
        "uSvcOutbId",
        "statEvetItem",
        "statEvetActnMn",
        "cpxRelEvetOutbSeqnCnt",
        "cpxRelEvetOutbSeqn",
        "outbPosCnt",
        "statEvetItemCnt",
        "statEvetActnDtm",
        "statEvetId",
        "outbMainGb",
    ];

    #[test]
    fn keys_serialize_in_wire_order() {
        let msg = ForwardMessage::new(&BodySettings::default(), "20210517150516142");
        let text = String::from_utf8(msg.to_bytes().unwrap()).unwrap();
        assert!(text.starts_with(r#"{"StatEvet":{"statEvetGdCd":"99","#));

        let positions: Vec<usize> = KEY_ORDER
            .iter()
            .map(|k| text.find(&format!("\"{k}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn default_values() {
        let msg = ForwardMessage::new(&BodySettings::default(), "20210517150516142");
        let v: serde_json::Value = serde_json::from_slice(&msg.to_bytes().unwrap()).unwrap();
        let e = &v["StatEvet"];
        assert_eq!(e["outbPosNm"], "scold");
        assert_eq!(e["statEvetClrDtm"], "20210517150516142");
        assert_eq!(e["uSvcOutbId"], "intellivid-event");
        assert_eq!(e["statEvetId"], "SMT-PA1-000TAG002E01");
        assert_eq!(e["statEvetCntn"], serde_json::json!(["sleep", "comma", "flag"]));
        for counter in ["procSt", "cpxRelEvetOutbSeqnCnt", "outbPosCnt", "statEvetItemCnt"] {
            assert_eq!(e[counter], "0", "{counter}");
        }
        assert_eq!(e["statEvetNm"], "");
        assert_eq!(e.as_object().unwrap().len(), 21);
    }

    #[test]
    fn compact_timestamp_shape() {
        let ts = compact_timestamp();
        assert_eq!(ts.len(), 17);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }
}
