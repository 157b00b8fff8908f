use crate::bot::{Context, Error};
use crate::ledger::WorkSession;
use crate::utils::format::{create_error_embed, create_status_embed, describe_clock_error};
use poise::serenity_prelude as serenity;

/// Show your current session
#[poise::command(slash_command)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.to_string();
    let username = ctx.author().name.clone();
    let data = ctx.data();

    let active = match data.employee_for(ctx.author()).await {
        Ok(employee) => data.clock.active_session(employee.id).await,
        Err(e) => Err(e),
    };

    match active {
        Ok(session) => {
            let embed = create_status_embed(&username, session.as_ref(), &data.offset);
            let mut builder = poise::CreateReply::default().embed(embed);

            if let Some(session) = &session {
                builder = builder.components(vec![serenity::CreateActionRow::Buttons(
                    status_buttons(session, &user_id),
                )]);
            }

            ctx.send(builder).await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &describe_clock_error(&e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

// Custom ids carry the owner's Discord id so other users can't press them.
fn status_buttons(session: &WorkSession, user_id: &str) -> Vec<serenity::CreateButton> {
    let break_button = if session.open_break().is_some() {
        serenity::CreateButton::new(format!("break_end:{}", user_id))
            .label("▶️ End break")
            .style(serenity::ButtonStyle::Primary)
    } else {
        serenity::CreateButton::new(format!("break_start:{}", user_id))
            .label("☕ Start break")
            .style(serenity::ButtonStyle::Secondary)
    };

    vec![
        break_button,
        serenity::CreateButton::new(format!("clock_out:{}", user_id))
            .label("🔴 Clock out")
            .style(serenity::ButtonStyle::Danger),
    ]
}
