// src/models/team.rs
use super::split_list;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    Open,
    Closed,
}

impl TeamStatus {
    pub fn toggled(self) -> Self {
        match self {
            TeamStatus::Open => TeamStatus::Closed,
            TeamStatus::Closed => TeamStatus::Open,
        }
    }
}

// Row of the `teams` table, joined with the leader's name
#[derive(Debug, Clone, FromRow)]
pub struct Team {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub description: String,
    pub period: Option<String>,
    pub deadline: NaiveDate,
    pub status: TeamStatus,
    pub tech_stack: Option<String>,
    pub tags: Option<String>,
    pub contact: Option<String>,
    pub leader_id: i64,
    pub leader_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// A posting takes applications (and leader edits) only while it is open
    /// and the deadline day has not passed.
    pub fn is_accepting(&self, today: NaiveDate) -> bool {
        self.status == TeamStatus::Open && today <= self.deadline
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeamRole {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub headcount: i64,
    pub applied_count: i64,
}

impl TeamRole {
    pub fn is_full(&self) -> bool {
        self.applied_count >= self.headcount
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamView {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub description: String,
    pub period: Option<String>,
    pub deadline: NaiveDate,
    pub status: TeamStatus,
    pub is_accepting: bool,
    pub tech_stack: Vec<String>,
    pub tags: Vec<String>,
    pub contact: Option<String>,
    pub leader_id: i64,
    pub leader_name: String,
    pub roles: Vec<TeamRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamView {
    pub fn new(team: Team, roles: Vec<TeamRole>, today: NaiveDate) -> Self {
        let is_accepting = team.is_accepting(today);
        Self {
            id: team.id,
            tech_stack: split_list(team.tech_stack.as_deref()),
            tags: split_list(team.tags.as_deref()),
            title: team.title,
            category: team.category,
            description: team.description,
            period: team.period,
            deadline: team.deadline,
            status: team.status,
            is_accepting,
            contact: team.contact,
            leader_id: team.leader_id,
            leader_name: team.leader_name,
            roles,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleInput {
    #[validate(length(min = 1, max = 64, message = "role name is required"))]
    pub name: String,
    #[validate(range(min = 1, max = 100, message = "headcount must be between 1 and 100"))]
    pub headcount: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 120, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 40, message = "category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub period: Option<String>,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub contact: Option<String>,
    #[validate(length(min = 1, message = "at least one role is required"), nested)]
    pub roles: Vec<RoleInput>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 120, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 40, message = "category must not be empty"))]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    pub period: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub tech_stack: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub contact: Option<String>,
    #[validate(length(min = 1, message = "at least one role is required"), nested)]
    pub roles: Option<Vec<RoleInput>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TeamQuery {
    pub status: Option<TeamStatus>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub role_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ApplicationStatus {
    pub applied: bool,
    pub role_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: i64,
    pub status: TeamStatus,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Applicant {
    pub application_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
    pub tech_stack: Option<String>,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AppliedTeam {
    pub team: TeamView,
    pub role_id: i64,
    pub role_name: String,
}

#[derive(Debug, Serialize)]
pub struct MyTeams {
    pub leading: Vec<TeamView>,
    pub applied: Vec<AppliedTeam>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(status: TeamStatus, deadline: NaiveDate) -> Team {
        let now = Utc::now();
        Team {
            id: 1,
            title: "Hackathon".into(),
            category: "hackathon".into(),
            description: "desc".into(),
            period: None,
            deadline,
            status,
            tech_stack: None,
            tags: None,
            contact: None,
            leader_id: 1,
            leader_name: "Lee".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn open_team_accepts_until_deadline_day_inclusive() {
        let t = team(TeamStatus::Open, day("2025-05-10"));
        assert!(t.is_accepting(day("2025-05-09")));
        assert!(t.is_accepting(day("2025-05-10")));
        assert!(!t.is_accepting(day("2025-05-11")));
    }

    #[test]
    fn closed_team_never_accepts() {
        let t = team(TeamStatus::Closed, day("2999-01-01"));
        assert!(!t.is_accepting(day("2025-05-09")));
    }

    fn create_request(roles: Vec<RoleInput>) -> CreateTeamRequest {
        CreateTeamRequest {
            title: "Capstone".into(),
            category: "project".into(),
            description: "desc".into(),
            period: None,
            deadline: day("2999-01-01"),
            tech_stack: vec![],
            tags: vec![],
            contact: None,
            roles,
        }
    }

    #[test]
    fn role_list_is_checked_as_a_whole_and_per_entry() {
        let backend = RoleInput { name: "backend".into(), headcount: 2 };
        assert!(create_request(vec![backend.clone()]).validate().is_ok());

        let errors = create_request(vec![]).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("roles"));

        let zero = RoleInput { name: "design".into(), headcount: 0 };
        assert!(create_request(vec![backend.clone(), zero]).validate().is_err());

        let update = UpdateTeamRequest { roles: Some(vec![]), ..Default::default() };
        assert!(update.validate().is_err());
        let update = UpdateTeamRequest { roles: Some(vec![backend]), ..Default::default() };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn status_toggle_flips() {
        assert_eq!(TeamStatus::Open.toggled(), TeamStatus::Closed);
        assert_eq!(TeamStatus::Closed.toggled(), TeamStatus::Open);
    }
}
