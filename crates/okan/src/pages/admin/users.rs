use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::access::resolver::RoleResolver;
use crate::access::role::Role;
use crate::api::error::ApiError;
use crate::api::query::Query;
use crate::db::{Db, Profile, UserRole};
use crate::pages::Notice;
use crate::util;

#[derive(Debug, Clone, Serialize)]
pub struct RoleBadge {
    /// Role row id, used to remove it.
    pub id: Uuid,
    pub role: Role,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserEntry {
    pub user_id: Uuid,
    pub full_name: String,
    pub initials: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<RoleBadge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleOption {
    pub value: Role,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserList {
    pub users: Vec<UserEntry>,
    pub role_options: Vec<RoleOption>,
}

fn default_role() -> Role {
    Role::Student
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddRoleForm {
    pub user_id: Uuid,
    #[serde(default = "default_role")]
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveRoleForm {
    pub role_id: Uuid,
}

/// Profiles newest first, each with its role rows.
pub async fn list(db: Db<'_>) -> Result<UserList, ApiError> {
    let (profiles, roles) = futures::try_join!(
        db.list::<Profile>(Query::new().order_by_desc("created_at")),
        db.list::<UserRole>(Query::new().order_by("created_at")),
    )?;

    let mut by_user: HashMap<Uuid, Vec<RoleBadge>> = HashMap::new();
    for row in roles {
        by_user.entry(row.user_id).or_default().push(RoleBadge {
            id: row.id,
            role: row.role,
            label: row.role.label(),
        });
    }

    Ok(UserList {
        users: profiles
            .into_iter()
            .map(|p| UserEntry {
                roles: by_user.remove(&p.user_id).unwrap_or_default(),
                initials: util::initials(p.full_name.as_deref()),
                full_name: p.full_name.unwrap_or_else(|| "Usuário".to_string()),
                user_id: p.user_id,
                avatar_url: p.avatar_url,
                created_at: p.created_at,
            })
            .collect(),
        role_options: Role::ALL
            .into_iter()
            .map(|value| RoleOption {
                value,
                label: value.label(),
            })
            .collect(),
    })
}

async fn try_add(db: Db<'_>, form: &AddRoleForm) -> Result<bool, ApiError> {
    let held: Vec<UserRole> = db
        .list(Query::new().eq("user_id", form.user_id))
        .await?;
    if held.iter().any(|r| r.role == form.role) {
        return Ok(false);
    }

    #[derive(Serialize)]
    struct NewRole {
        user_id: Uuid,
        role: Role,
    }

    db.insert::<UserRole>(&NewRole {
        user_id: form.user_id,
        role: form.role,
    })
    .await?;
    Ok(true)
}

/// Grants a role unless the user already holds it.
pub async fn add_role(db: Db<'_>, resolver: &RoleResolver, form: AddRoleForm) -> Notice {
    match try_add(db, &form).await {
        Ok(true) => {
            info!(user = %form.user_id, role = %form.role, "Role granted");
            resolver.invalidate(form.user_id);
            Notice::success("Papel adicionado com sucesso!")
        }
        Ok(false) => Notice::error("Usuário já possui este papel"),
        Err(e) => Notice::failed("Erro ao adicionar papel: ", &e),
    }
}

async fn try_remove(db: Db<'_>, role_id: Uuid) -> Result<UserRole, ApiError> {
    let row: UserRole = db.one(Query::new().eq("id", role_id)).await?;
    db.delete::<UserRole>(Query::new().eq("id", role_id)).await?;
    Ok(row)
}

pub async fn remove_role(db: Db<'_>, resolver: &RoleResolver, form: RemoveRoleForm) -> Notice {
    match try_remove(db, form.role_id).await {
        Ok(row) => {
            info!(user = %row.user_id, role = %row.role, "Role revoked");
            resolver.invalidate(row.user_id);
            Notice::success("Papel removido com sucesso!")
        }
        Err(e) => Notice::failed("Erro ao remover papel: ", &e),
    }
}
