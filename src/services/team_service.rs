// src/services/team_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        join_list, non_empty,
        team::{
            Applicant, ApplicationStatus, AppliedTeam, CreateTeamRequest, MyTeams, RoleInput, Team,
            TeamQuery, TeamRole, TeamStatus, TeamView, UpdateTeamRequest,
        },
        user::CurrentUser,
    },
    services::is_unique_violation,
};
use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

const TEAM_SELECT: &str = r#"
    SELECT t.id, t.title, t.category, t.description, t.period, t.deadline, t.status,
           t.tech_stack, t.tags, t.contact, t.leader_id, u.name AS leader_name,
           t.created_at, t.updated_at
    FROM teams t
    JOIN users u ON u.id = t.leader_id
"#;

const ROLE_SELECT: &str = r#"
    SELECT r.id, r.team_id, r.name, r.headcount,
           (SELECT COUNT(*) FROM team_applications a WHERE a.role_id = r.id) AS applied_count
    FROM team_roles r
"#;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn ensure_leader_or_admin(team: &Team, actor: &CurrentUser) -> AppResult<()> {
    if team.leader_id == actor.id || actor.is_admin() {
        Ok(())
    } else {
        tracing::warn!("User {} is not allowed to manage team {}", actor.id, team.id);
        Err(AppError::Forbidden)
    }
}

pub async fn find_team(db_pool: &SqlitePool, team_id: i64) -> AppResult<Team> {
    let sql = format!("{} WHERE t.id = ?1", TEAM_SELECT);
    sqlx::query_as::<_, Team>(&sql)
        .bind(team_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("team {} not found", team_id)))
}

/// Roles of a team with their live `applied_count`, in creation order.
pub async fn list_roles(db_pool: &SqlitePool, team_id: i64) -> AppResult<Vec<TeamRole>> {
    let sql = format!("{} WHERE r.team_id = ?1 ORDER BY r.id ASC", ROLE_SELECT);
    let roles = sqlx::query_as::<_, TeamRole>(&sql)
        .bind(team_id)
        .fetch_all(db_pool)
        .await?;
    Ok(roles)
}

async fn view(db_pool: &SqlitePool, team: Team) -> AppResult<TeamView> {
    let roles = list_roles(db_pool, team.id).await?;
    Ok(TeamView::new(team, roles, today()))
}

pub async fn get_team(db_pool: &SqlitePool, team_id: i64) -> AppResult<TeamView> {
    let team = find_team(db_pool, team_id).await?;
    view(db_pool, team).await
}

pub async fn list_teams(db_pool: &SqlitePool, query: &TeamQuery) -> AppResult<Vec<TeamView>> {
    let sql = format!(
        "{} WHERE (?1 IS NULL OR t.status = ?1) AND (?2 IS NULL OR t.category = ?2) ORDER BY t.created_at DESC, t.id DESC",
        TEAM_SELECT
    );
    let category = query.category.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let teams = sqlx::query_as::<_, Team>(&sql)
        .bind(query.status)
        .bind(category)
        .fetch_all(db_pool)
        .await?;

    tracing::debug!("Listing {} teams.", teams.len());
    let mut views = Vec::with_capacity(teams.len());
    for team in teams {
        views.push(view(db_pool, team).await?);
    }
    Ok(views)
}

async fn insert_roles(tx: &mut Transaction<'_, Sqlite>, team_id: i64, roles: &[RoleInput]) -> AppResult<()> {
    for role in roles {
        sqlx::query("INSERT INTO team_roles (team_id, name, headcount) VALUES (?1, ?2, ?3)")
            .bind(team_id)
            .bind(role.name.trim())
            .bind(role.headcount)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Creates a posting and its roles in one transaction. Only club members
/// (MEMBER or ADMIN) may lead a team.
pub async fn create_team(db_pool: &SqlitePool, actor: &CurrentUser, req: &CreateTeamRequest) -> AppResult<TeamView> {
    if !actor.role.is_member() {
        return Err(AppError::Forbidden);
    }
    if req.deadline < today() {
        return Err(AppError::Validation("deadline must not be in the past".into()));
    }

    tracing::info!("User {} creates team '{}'", actor.id, req.title);
    let now = Utc::now();
    let mut tx = db_pool.begin().await?;

    let team_id = sqlx::query(
        r#"
        INSERT INTO teams (title, category, description, period, deadline, status,
                           tech_stack, tags, contact, leader_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
        "#,
    )
    .bind(req.title.trim())
    .bind(req.category.trim())
    .bind(&req.description)
    .bind(non_empty(req.period.clone()))
    .bind(req.deadline)
    .bind(TeamStatus::Open)
    .bind(join_list(&req.tech_stack))
    .bind(join_list(&req.tags))
    .bind(non_empty(req.contact.clone()))
    .bind(actor.id)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    insert_roles(&mut tx, team_id, &req.roles).await?;
    tx.commit().await?;

    tracing::info!("✅ Team {} created.", team_id);
    get_team(db_pool, team_id).await
}

/// Reconciles roles by name: matching roles keep their applications,
/// dropped roles take their applications with them.
async fn replace_roles(tx: &mut Transaction<'_, Sqlite>, team_id: i64, roles: &[RoleInput]) -> AppResult<()> {
    let existing: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM team_roles WHERE team_id = ?1")
        .bind(team_id)
        .fetch_all(&mut **tx)
        .await?;

    for (role_id, name) in &existing {
        match roles.iter().find(|r| r.name.trim() == name) {
            Some(kept) => {
                let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_applications WHERE role_id = ?1")
                    .bind(role_id)
                    .fetch_one(&mut **tx)
                    .await?;
                if kept.headcount < applied {
                    return Err(AppError::Conflict(format!(
                        "role '{}' already has {} applicants, headcount cannot go below that",
                        name, applied
                    )));
                }
                sqlx::query("UPDATE team_roles SET headcount = ?1 WHERE id = ?2")
                    .bind(kept.headcount)
                    .bind(role_id)
                    .execute(&mut **tx)
                    .await?;
            }
            None => {
                sqlx::query("DELETE FROM team_roles WHERE id = ?1")
                    .bind(role_id)
                    .execute(&mut **tx)
                    .await?;
            }
        }
    }

    let added: Vec<RoleInput> = roles
        .iter()
        .filter(|r| !existing.iter().any(|(_, name)| name == r.name.trim()))
        .cloned()
        .collect();
    insert_roles(tx, team_id, &added).await
}

/// Partial update. When `roles` is given the role set is replaced by name:
/// kept roles keep their id and applicants, missing roles are deleted along
/// with their applications.
pub async fn update_team(
    db_pool: &SqlitePool,
    actor: &CurrentUser,
    team_id: i64,
    req: &UpdateTeamRequest,
) -> AppResult<TeamView> {
    let mut team = find_team(db_pool, team_id).await?;
    ensure_leader_or_admin(&team, actor)?;
    if !actor.is_admin() && !team.is_accepting(today()) {
        return Err(AppError::Conflict(
            "a closed or expired posting can no longer be edited".into(),
        ));
    }

    if let Some(title) = &req.title {
        team.title = title.trim().to_string();
    }
    if let Some(category) = &req.category {
        team.category = category.trim().to_string();
    }
    if let Some(description) = &req.description {
        team.description = description.clone();
    }
    if req.period.is_some() {
        team.period = non_empty(req.period.clone());
    }
    if let Some(deadline) = req.deadline {
        team.deadline = deadline;
    }
    if let Some(stack) = &req.tech_stack {
        team.tech_stack = join_list(stack);
    }
    if let Some(tags) = &req.tags {
        team.tags = join_list(tags);
    }
    if req.contact.is_some() {
        team.contact = non_empty(req.contact.clone());
    }

    let mut tx = db_pool.begin().await?;
    sqlx::query(
        r#"
        UPDATE teams SET title = ?1, category = ?2, description = ?3, period = ?4, deadline = ?5,
                         tech_stack = ?6, tags = ?7, contact = ?8, updated_at = ?9
        WHERE id = ?10
        "#,
    )
    .bind(&team.title)
    .bind(&team.category)
    .bind(&team.description)
    .bind(&team.period)
    .bind(team.deadline)
    .bind(&team.tech_stack)
    .bind(&team.tags)
    .bind(&team.contact)
    .bind(Utc::now())
    .bind(team_id)
    .execute(&mut *tx)
    .await?;

    if let Some(roles) = &req.roles {
        replace_roles(&mut tx, team_id, roles).await?;
    }
    tx.commit().await?;

    tracing::info!("✅ Team {} updated by user {}.", team_id, actor.id);
    get_team(db_pool, team_id).await
}

pub async fn delete_team(db_pool: &SqlitePool, actor: &CurrentUser, team_id: i64) -> AppResult<()> {
    let team = find_team(db_pool, team_id).await?;
    ensure_leader_or_admin(&team, actor)?;
    sqlx::query("DELETE FROM teams WHERE id = ?1")
        .bind(team_id)
        .execute(db_pool)
        .await?;
    tracing::info!("🗑️ Team {} deleted by user {}.", team_id, actor.id);
    Ok(())
}

/// Flips OPEN and CLOSED. Leader or admin only.
pub async fn toggle_status(db_pool: &SqlitePool, actor: &CurrentUser, team_id: i64) -> AppResult<TeamStatus> {
    let team = find_team(db_pool, team_id).await?;
    ensure_leader_or_admin(&team, actor)?;
    let next = team.status.toggled();
    sqlx::query("UPDATE teams SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(next)
        .bind(Utc::now())
        .bind(team_id)
        .execute(db_pool)
        .await?;
    tracing::info!("Team {} status {:?} -> {:?}", team_id, team.status, next);
    Ok(next)
}

/// Applies the caller to one role. A user holds at most one application per
/// team, and the team's leader cannot apply.
pub async fn apply(db_pool: &SqlitePool, actor: &CurrentUser, team_id: i64, role_id: i64) -> AppResult<ApplicationStatus> {
    let team = find_team(db_pool, team_id).await?;
    if !team.is_accepting(today()) {
        tracing::warn!("Application to team {} refused: not accepting", team_id);
        return Err(AppError::Conflict(
            "this team is not accepting applications (closed or past its deadline)".into(),
        ));
    }
    if team.leader_id == actor.id {
        return Err(AppError::Conflict("the leader cannot apply to their own team".into()));
    }

    let roles = list_roles(db_pool, team_id).await?;
    let role = roles
        .iter()
        .find(|r| r.id == role_id)
        .ok_or_else(|| AppError::NotFound(format!("role {} not found in team {}", role_id, team_id)))?;
    if role.is_full() {
        return Err(AppError::Conflict(format!("role '{}' is already full", role.name)));
    }

    // Seat check and insert are one statement; zero rows inserted means full.
    let result = sqlx::query(
        r#"
        INSERT INTO team_applications (team_id, role_id, user_id, created_at)
        SELECT ?1, ?2, ?3, ?4
        WHERE (SELECT COUNT(*) FROM team_applications WHERE role_id = ?2)
              < (SELECT headcount FROM team_roles WHERE id = ?2)
        "#,
    )
    .bind(team_id)
    .bind(role_id)
    .bind(actor.id)
    .bind(Utc::now())
    .execute(db_pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            tracing::warn!("Application to team {} refused: role {} filled up", team_id, role_id);
            Err(AppError::Conflict(format!("role '{}' is already full", role.name)))
        }
        Ok(_) => {
            tracing::info!("✅ User {} applied to team {} as role {}", actor.id, team_id, role_id);
            Ok(ApplicationStatus { applied: true, role_id: Some(role_id) })
        }
        Err(e) if is_unique_violation(&e) => {
            Err(AppError::Conflict("you have already applied to this team".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cancel_application(db_pool: &SqlitePool, actor: &CurrentUser, team_id: i64) -> AppResult<()> {
    find_team(db_pool, team_id).await?;
    let removed = sqlx::query("DELETE FROM team_applications WHERE team_id = ?1 AND user_id = ?2")
        .bind(team_id)
        .bind(actor.id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(AppError::NotFound("no application to cancel".into()));
    }
    tracing::info!("User {} cancelled application to team {}", actor.id, team_id);
    Ok(())
}

pub async fn application_status(db_pool: &SqlitePool, user_id: i64, team_id: i64) -> AppResult<ApplicationStatus> {
    find_team(db_pool, team_id).await?;
    let role_id: Option<i64> = sqlx::query_scalar(
        "SELECT role_id FROM team_applications WHERE team_id = ?1 AND user_id = ?2",
    )
    .bind(team_id)
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(ApplicationStatus { applied: role_id.is_some(), role_id })
}

/// Applicants for the leader's review. Emails follow the applicant's privacy flag.
pub async fn list_applications(db_pool: &SqlitePool, actor: &CurrentUser, team_id: i64) -> AppResult<Vec<Applicant>> {
    let team = find_team(db_pool, team_id).await?;
    ensure_leader_or_admin(&team, actor)?;
    let applicants = sqlx::query_as::<_, Applicant>(
        r#"
        SELECT a.id AS application_id, a.role_id, r.name AS role_name, u.id AS user_id,
               u.username, u.name,
               CASE WHEN u.show_email THEN u.email ELSE NULL END AS email,
               u.tech_stack, a.created_at AS applied_at
        FROM team_applications a
        JOIN team_roles r ON r.id = a.role_id
        JOIN users u ON u.id = a.user_id
        WHERE a.team_id = ?1
        ORDER BY a.created_at ASC, a.id ASC
        "#,
    )
    .bind(team_id)
    .fetch_all(db_pool)
    .await?;
    Ok(applicants)
}

pub async fn my_teams(db_pool: &SqlitePool, user_id: i64) -> AppResult<MyTeams> {
    let sql = format!("{} WHERE t.leader_id = ?1 ORDER BY t.created_at DESC, t.id DESC", TEAM_SELECT);
    let led = sqlx::query_as::<_, Team>(&sql)
        .bind(user_id)
        .fetch_all(db_pool)
        .await?;
    let mut leading = Vec::with_capacity(led.len());
    for team in led {
        leading.push(view(db_pool, team).await?);
    }

    let applications: Vec<(i64, i64, String)> = sqlx::query_as(
        r#"
        SELECT a.team_id, a.role_id, r.name
        FROM team_applications a
        JOIN team_roles r ON r.id = a.role_id
        WHERE a.user_id = ?1
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    let mut applied = Vec::with_capacity(applications.len());
    for (team_id, role_id, role_name) in applications {
        applied.push(AppliedTeam {
            team: get_team(db_pool, team_id).await?,
            role_id,
            role_name,
        });
    }

    Ok(MyTeams { leading, applied })
}
