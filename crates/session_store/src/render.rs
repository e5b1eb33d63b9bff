use agent_provider::Role;

use crate::schema::ChatLogRecord;

/// Human-readable rendering written next to each JSON record.
#[must_use]
pub fn render_markdown(record: &ChatLogRecord) -> String {
    let mut out = String::from("# Design & Development Chat Log\n\n");
    out.push_str(&format!(
        "Project: {}\n",
        record.project.as_deref().unwrap_or("None")
    ));
    out.push_str(&format!("Date: {}\n\n", record.timestamp));

    for turn in &record.history {
        let heading = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        out.push_str(&format!("## {heading}\n\n{}\n\n", turn.content));
    }

    out
}

#[cfg(test)]
mod tests {
    use agent_provider::Turn;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn renders_header_and_one_section_per_turn() {
        let record = ChatLogRecord {
            project: None,
            timestamp: "20260101_000000".to_string(),
            history: vec![Turn::user("hi"), Turn::assistant("hello")],
        };

        assert_eq!(
            render_markdown(&record),
            "# Design & Development Chat Log\n\n\
             Project: None\n\
             Date: 20260101_000000\n\n\
             ## User\n\nhi\n\n\
             ## Assistant\n\nhello\n\n"
        );
    }
}
