use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub allow_multiple_answers: bool,
    #[serde(default)]
    pub voters: Vec<VoteRecord>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub user_id: String,
    pub voted_options: Vec<usize>,
    pub voted_at: DateTime<Utc>,
}

/// Answer to "has this voter already voted on this poll?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted_options: Option<Vec<usize>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn poll_serializes_with_camel_case_fields() {
        let poll = Poll {
            id: "p1".into(),
            question: "Tea or coffee?".into(),
            options: vec![PollOption {
                text: "Tea".into(),
                votes: 1,
            }],
            allow_multiple_answers: false,
            voters: vec![VoteRecord {
                user_id: "u1".into(),
                voted_options: vec![0],
                voted_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            }],
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        let value = serde_json::to_value(&poll).unwrap();
        assert_eq!(value["allowMultipleAnswers"], false);
        assert_eq!(value["options"][0]["votes"], 1);
        assert_eq!(value["voters"][0]["userId"], "u1");
        assert_eq!(value["voters"][0]["votedOptions"][0], 0);
        assert!(value["createdAt"].as_str().unwrap().starts_with("2024-01-01"));
    }

    #[test]
    fn vote_status_omits_options_when_not_voted() {
        let status = VoteStatus {
            has_voted: false,
            voted_options: None,
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, serde_json::json!({ "hasVoted": false }));
    }
}
