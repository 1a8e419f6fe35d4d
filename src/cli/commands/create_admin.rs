use crate::api::RegisterRequest;
use crate::api::validation;
use crate::config::Config;
use crate::models::user::UserRole;
use crate::state::SharedState;

/// Registration never grants privileges, so the first administrator has to
/// come from here.
pub async fn cmd_create_admin(
    config: Config,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
) -> anyhow::Result<()> {
    let mut new_user = validation::register(&RegisterRequest {
        email: Some(email),
        password: Some(password),
        first_name: Some(first_name),
        last_name: Some(last_name),
        role: None,
    })
    .map_err(|e| anyhow::anyhow!("{e}"))?;
    new_user.role = UserRole::Admin;

    let state = SharedState::new(config).await?;
    let user = state.user_service.create(new_user).await?;

    println!("Created administrator {} (id {})", user.email, user.id);
    Ok(())
}
