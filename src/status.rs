//! Pulls the newest homework record out of an API response and turns it into
//! the notification text.
use serde_json::Value;
use tracing::debug;

use crate::error::WatchError;
use crate::model::{HomeworkRecord, HomeworkStatus};

/// Returns the first entry of `homeworks`, or `None` when the list is empty.
pub fn extract_homework(response: &Value) -> Result<Option<HomeworkRecord>, WatchError> {
    let object = response
        .as_object()
        .ok_or(WatchError::InvalidResponseShape("response is not a JSON object"))?;

    let homeworks = match object.get("homeworks") {
        None | Some(Value::Null) => return Err(WatchError::MissingHomeworksKey),
        Some(Value::Array(list)) => list,
        Some(_) => {
            return Err(WatchError::InvalidResponseShape(
                "\"homeworks\" is not a list",
            ))
        }
    };

    let Some(first) = homeworks.first() else {
        debug!("no homework updates in this window");
        return Ok(None);
    };
    if !first.is_object() {
        return Err(WatchError::InvalidResponseShape(
            "homework entry is not a JSON object",
        ));
    }
    let record: HomeworkRecord = serde_json::from_value(first.clone()).map_err(|_| {
        WatchError::InvalidResponseShape("homework fields are not strings")
    })?;
    Ok(Some(record))
}

pub fn parse_status(record: &HomeworkRecord) -> Result<String, WatchError> {
    let name = record
        .homework_name
        .as_deref()
        .ok_or(WatchError::MissingRequiredField("homework_name"))?;
    let code = record
        .status
        .as_deref()
        .ok_or(WatchError::MissingRequiredField("status"))?;
    let status: HomeworkStatus = code.parse()?;
    Ok(format!(
        "Изменился статус проверки работы \"{}\". {}",
        name,
        status.verdict()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_every_known_status() {
        for (code, verdict) in [
            ("approved", "Работа проверена: ревьюеру всё понравилось. Ура!"),
            ("reviewing", "Работа взята на проверку ревьюером."),
            ("rejected", "Работа проверена: у ревьюера есть замечания."),
        ] {
            let msg = parse_status(&HomeworkRecord::new("hw_api", code)).unwrap();
            assert!(msg.contains("\"hw_api\""));
            assert!(msg.ends_with(verdict), "{code}: {msg}");
        }
    }

    #[test]
    fn reviewing_message_is_exact() {
        let msg = parse_status(&HomeworkRecord::new("task1", "reviewing")).unwrap();
        assert_eq!(
            msg,
            "Изменился статус проверки работы \"task1\". Работа взята на проверку ревьюером."
        );
    }

    #[test]
    fn unknown_status_is_reported() {
        let err = parse_status(&HomeworkRecord::new("task1", "pending")).unwrap_err();
        match err {
            WatchError::UnknownStatusCode(code) => assert_eq!(code, "pending"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn missing_fields_are_required() {
        let no_name = HomeworkRecord {
            homework_name: None,
            status: Some("approved".into()),
        };
        assert!(matches!(
            parse_status(&no_name),
            Err(WatchError::MissingRequiredField("homework_name"))
        ));

        let no_status = HomeworkRecord {
            homework_name: Some("task1".into()),
            status: None,
        };
        assert!(matches!(
            parse_status(&no_status),
            Err(WatchError::MissingRequiredField("status"))
        ));
    }

    #[test]
    fn extracts_first_entry_only() {
        let body = json!({
            "homeworks": [
                {"homework_name": "newest", "status": "approved", "id": 7},
                {"homework_name": "older", "status": "rejected"}
            ],
            "current_date": 1700000000
        });
        let record = extract_homework(&body).unwrap().unwrap();
        assert_eq!(record, HomeworkRecord::new("newest", "approved"));
    }

    #[test]
    fn empty_list_yields_nothing() {
        assert_eq!(extract_homework(&json!({"homeworks": []})).unwrap(), None);
    }

    #[test]
    fn non_object_response_is_rejected() {
        assert!(matches!(
            extract_homework(&json!([{"homework_name": "x"}])),
            Err(WatchError::InvalidResponseShape(_))
        ));
        assert!(matches!(
            extract_homework(&json!({"homeworks": "nope"})),
            Err(WatchError::InvalidResponseShape(_))
        ));
        assert!(matches!(
            extract_homework(&json!({"homeworks": [42]})),
            Err(WatchError::InvalidResponseShape(_))
        ));
    }

    #[test]
    fn missing_homeworks_key() {
        assert!(matches!(
            extract_homework(&json!({"current_date": 1})),
            Err(WatchError::MissingHomeworksKey)
        ));
        assert!(matches!(
            extract_homework(&json!({"homeworks": null})),
            Err(WatchError::MissingHomeworksKey)
        ));
    }

    #[test]
    fn record_without_name_is_extracted_then_rejected() {
        let record = extract_homework(&json!({"homeworks": [{"status": "approved"}]}))
            .unwrap()
            .unwrap();
        assert_eq!(record.homework_name, None);
        assert!(matches!(
            parse_status(&record),
            Err(WatchError::MissingRequiredField("homework_name"))
        ));
    }
}
