use crate::bot::{Context, Error, is_admin};
use crate::ledger::WorkSession;
use crate::utils::format::{clip_description, create_error_embed, create_info_embed, describe_clock_error, format_session_history};
use poise::serenity_prelude as serenity;
use uuid::Uuid;

const RECENT_SESSIONS: usize = 5;

/// Recent sessions with every break and location (admins may query other members)
#[poise::command(slash_command)]
pub async fn sessions(
    ctx: Context<'_>,
    #[description = "Member to query (admin only)"] member: Option<serenity::User>,
) -> Result<(), Error> {
    let data = ctx.data();
    let target = member.as_ref().unwrap_or_else(|| ctx.author());

    if target.id != ctx.author().id && !is_admin(ctx).await {
        let embed = create_error_embed("Error", "Only admins can view other members' sessions.");
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        return Ok(());
    }

    let sessions = match data.subject_for(ctx.author(), target).await {
        Ok(Some(employee)) => data.clock.sessions_for(employee.id).await,
        Ok(None) => Ok(Vec::new()),
        Err(e) => Err(e),
    };

    match sessions {
        Ok(sessions) => {
            let embed = create_info_embed(
                &format!("🗂️ Sessions of {}", target.name),
                &clip_description(&format_session_history(
                    recent(&sessions, RECENT_SESSIONS),
                    &data.offset,
                )),
            );
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
        }
        Err(e) => {
            tracing::error!("Failed to load sessions for {}: {:?}", target.id, e);
            let embed = create_error_embed("Error", &describe_clock_error(&e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// One session with its breaks and locations (yours, or any for admins)
#[poise::command(slash_command)]
pub async fn session(
    ctx: Context<'_>,
    #[description = "Session id"] session_id: String,
) -> Result<(), Error> {
    let data = ctx.data();

    let Ok(session_id) = Uuid::parse_str(session_id.trim()) else {
        let embed = create_error_embed("Error", "That is not a valid session id.");
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        return Ok(());
    };

    let found = match data.clock.session(session_id).await {
        Ok(session) => match data.clock.find_employee(&ctx.author().id.to_string()).await {
            Ok(owner) => Ok((session, owner.map(|e| e.id))),
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    match found {
        Ok((session, invoker)) => {
            if invoker != Some(session.employee_id) && !is_admin(ctx).await {
                let embed = create_error_embed("Error", "Only admins can view other members' sessions.");
                ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                    .await?;
                return Ok(());
            }

            let embed = create_info_embed(
                "🗂️ Session",
                &clip_description(&format_session_history(&[session], &data.offset)),
            );
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &describe_clock_error(&e));
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
        }
    }

    Ok(())
}

/// The last `count` sessions, oldest first.
fn recent(sessions: &[WorkSession], count: usize) -> &[WorkSession] {
    &sessions[sessions.len().saturating_sub(count)..]
}
