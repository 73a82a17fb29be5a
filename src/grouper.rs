use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::{Group, Record, StudentKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GroupBy {
    /// One group per student name
    Name,
    /// One group per (name, roll number) pair
    NameRoll,
}

pub fn group_records(records: &[Record], group_by: GroupBy) -> Result<Vec<Group>> {
    let mut index: HashMap<StudentKey, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for record in records {
        let key = student_key(record, group_by)?;
        match index.get(&key) {
            Some(&slot) => groups[slot].records.push(record.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    records: vec![record.clone()],
                });
            }
        }
    }

    Ok(groups)
}

fn student_key(record: &Record, group_by: GroupBy) -> Result<StudentKey> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(Error::Schema(format!(
            "empty Name in row for course {:?}",
            record.course
        )));
    }

    let roll = match group_by {
        GroupBy::Name => None,
        GroupBy::NameRoll => match record
            .roll
            .as_deref()
            .map(str::trim)
            .filter(|roll| !roll.is_empty())
        {
            Some(roll) => Some(roll.to_string()),
            None => {
                return Err(Error::Schema(format!("row for {name} has no Roll Number")));
            }
        },
    };

    Ok(StudentKey {
        name: name.to_string(),
        roll,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, roll: Option<&str>, course: &str) -> Record {
        Record {
            name: name.to_string(),
            roll: roll.map(str::to_string),
            email: None,
            course: course.to_string(),
            code: "C1".to_string(),
            present: "10".to_string(),
            total: "20".to_string(),
            average: "50%".to_string(),
        }
    }

    #[test]
    fn partition_covers_every_row_exactly_once() {
        let records = vec![
            row("Amit", Some("R1"), "Math"),
            row("Nisha", Some("R2"), "Math"),
            row("Amit", Some("R1"), "Physics"),
        ];

        let groups = group_records(&records, GroupBy::Name).unwrap();
        assert_eq!(groups.len(), 2);
        let total: usize = groups.iter().map(|group| group.records.len()).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn groups_come_out_in_first_seen_order() {
        let records = vec![
            row("Nisha", Some("R2"), "Math"),
            row("Amit", Some("R1"), "Math"),
            row("Nisha", Some("R2"), "Physics"),
        ];

        let groups = group_records(&records, GroupBy::Name).unwrap();
        assert_eq!(groups[0].key.name, "Nisha");
        assert_eq!(groups[1].key.name, "Amit");
    }

    #[test]
    fn rows_keep_input_order_within_a_group() {
        let records = vec![
            row("Amit", Some("R1"), "Math"),
            row("Amit", Some("R1"), "Physics"),
            row("Amit", Some("R1"), "Chemistry"),
        ];

        let groups = group_records(&records, GroupBy::Name).unwrap();
        let courses: Vec<&str> = groups[0]
            .records
            .iter()
            .map(|record| record.course.as_str())
            .collect();
        assert_eq!(courses, ["Math", "Physics", "Chemistry"]);
    }

    #[test]
    fn roll_number_distinguishes_students_sharing_a_name() {
        let records = vec![
            row("Amit", Some("R1"), "Math"),
            row("Amit", Some("R7"), "Math"),
        ];

        let by_name = group_records(&records, GroupBy::Name).unwrap();
        assert_eq!(by_name.len(), 1);

        let by_name_roll = group_records(&records, GroupBy::NameRoll).unwrap();
        assert_eq!(by_name_roll.len(), 2);
    }

    #[test]
    fn missing_roll_under_name_roll_is_a_schema_error() {
        let records = vec![row("Amit", None, "Math")];
        let err = group_records(&records, GroupBy::NameRoll).unwrap_err();
        assert!(matches!(err, Error::Schema(_)), "got {err:?}");
    }
}
