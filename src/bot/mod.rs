pub mod commands;
pub mod handlers;
pub mod interactions;

use crate::config::Config;
use crate::database;
use crate::database::models::Employee;
use crate::geocoder::NominatimGeocoder;
use crate::timeclock::{ClockResult, TimeClock};
use crate::utils::time::display_offset;
use anyhow::Result;
use chrono::FixedOffset;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Clone)]
pub struct Data {
    pub clock: TimeClock,
    pub config: Config,
    pub offset: FixedOffset,
}

impl Data {
    /// Looks up (or registers) the employee behind a Discord user.
    pub async fn employee_for(&self, user: &serenity::User) -> ClockResult<Employee> {
        self.clock.register(&user.id.to_string(), &user.name).await
    }

    /// Resolves the member a read-only command is about. The invoker is
    /// registered on first use; anyone else is only looked up.
    pub async fn subject_for(
        &self,
        invoker: &serenity::User,
        target: &serenity::User,
    ) -> ClockResult<Option<Employee>> {
        if invoker.id == target.id {
            self.employee_for(invoker).await.map(Some)
        } else {
            self.clock.find_employee(&target.id.to_string()).await
        }
    }
}

/// Whether the invoking member carries the configured admin role.
pub async fn is_admin(ctx: Context<'_>) -> bool {
    let Some(role_id) = ctx
        .data()
        .config
        .admin_role_id
        .as_deref()
        .and_then(|id| id.parse::<u64>().ok())
    else {
        return false;
    };

    match ctx.author_member().await {
        Some(member) => member.roles.contains(&serenity::RoleId::new(role_id)),
        None => false,
    }
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;
    let geocoder = NominatimGeocoder::new(
        &config.geocoder_url,
        &config.geocoder_user_agent,
        config.geocoder_timeout,
    )?;

    let data = Data {
        clock: TimeClock::new(pool, Arc::new(geocoder)),
        offset: display_offset(config.display_utc_offset_hours)?,
        config: config.clone(),
    };

    let intents = serenity::GatewayIntents::non_privileged();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::attendance::clockin(),
                commands::attendance::clockout(),
                commands::breaks::breakstart(),
                commands::breaks::breakend(),
                commands::location::location(),
                commands::status::status(),
                commands::reports::report(),
                commands::reports::hours(),
                commands::sessions::sessions(),
                commands::sessions::session(),
                commands::admin::voidsession(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}
