use crate::capacity::Capacity;
use crate::task::{id_string, parse_date_lenient};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub specialty: String,
}

impl TeamMember {
    pub fn new(id: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            specialty: specialty.into(),
        }
    }
}

/// A member's tenure on a team over `[start_date, end_date)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAssignment {
    pub member_id: String,
    pub start_date: NaiveDate,
    /// `None` means open-ended.
    pub end_date: Option<NaiveDate>,
}

/// Wire shape of an assignment, before its dates are parsed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentRecord {
    #[serde(deserialize_with = "id_string")]
    member_id: String,
    #[serde(default)]
    start_date: serde_json::Value,
    #[serde(default)]
    end_date: serde_json::Value,
}

impl AssignmentRecord {
    /// Without a usable start the tenure is unknown and the record is dropped.
    /// A malformed end reads as open-ended.
    fn into_assignment(self) -> Option<MemberAssignment> {
        let start_date = self.start_date.as_str().and_then(parse_date_lenient)?;
        let end_date = self.end_date.as_str().and_then(parse_date_lenient);
        Some(MemberAssignment::new(self.member_id, start_date, end_date))
    }
}

fn lenient_assignments<'de, D>(deserializer: D) -> Result<Vec<MemberAssignment>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Vec::<AssignmentRecord>::deserialize(deserializer)?;
    let total = records.len();
    let assignments: Vec<MemberAssignment> = records
        .into_iter()
        .filter_map(AssignmentRecord::into_assignment)
        .collect();
    if assignments.len() < total {
        warn!(
            dropped = total - assignments.len(),
            "member assignments without a valid start date were skipped"
        );
    }
    Ok(assignments)
}

impl MemberAssignment {
    pub fn new(member_id: impl Into<String>, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            member_id: member_id.into(),
            start_date,
            end_date,
        }
    }

    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && self.end_date.is_none_or(|end| day < end)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Current headcount per specialty, used when no membership timeline applies.
    #[serde(default)]
    pub sizes: Capacity,
    #[serde(default, deserialize_with = "lenient_assignments")]
    pub member_assignments: Vec<MemberAssignment>,
}

impl Team {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sizes: BTreeMap::new(),
            member_assignments: Vec::new(),
        }
    }

    pub fn with_size(mut self, specialty: impl Into<String>, headcount: u32) -> Self {
        self.sizes.insert(specialty.into(), headcount);
        self
    }

    pub fn with_assignment(mut self, assignment: MemberAssignment) -> Self {
        self.member_assignments.push(assignment);
        self
    }

    /// Headcount per specialty on `day`, from active assignments.
    ///
    /// Assignments whose member is missing from `directory` are skipped.
    pub fn headcount_on(&self, day: NaiveDate, directory: &MemberDirectory<'_>) -> Capacity {
        let mut capacity = Capacity::new();
        for assignment in &self.member_assignments {
            if !assignment.is_active_on(day) {
                continue;
            }
            if let Some(specialty) = directory.specialty(&assignment.member_id) {
                *capacity.entry(specialty.to_string()).or_insert(0) += 1;
            }
        }
        capacity
    }

    pub fn earliest_assignment_start(&self) -> Option<NaiveDate> {
        self.member_assignments.iter().map(|a| a.start_date).min()
    }

    pub fn latest_assignment_end(&self) -> Option<NaiveDate> {
        self.member_assignments.iter().filter_map(|a| a.end_date).max()
    }
}

/// Resolves member id to specialty.
pub struct MemberDirectory<'a> {
    by_id: HashMap<&'a str, &'a str>,
}

impl<'a> MemberDirectory<'a> {
    pub fn new(members: &'a [TeamMember]) -> Self {
        let by_id = members
            .iter()
            .map(|member| (member.id.as_str(), member.specialty.as_str()))
            .collect();
        Self { by_id }
    }

    pub fn specialty(&self, member_id: &str) -> Option<&'a str> {
        self.by_id.get(member_id).copied()
    }
}
