use crate::bot::{Context, Error, is_admin};
use crate::utils::format::{describe_clock_error, format_error_message, format_success_message};
use crate::utils::time::format_datetime;
use uuid::Uuid;

/// Delete a work session with its breaks and locations (admin only)
#[poise::command(slash_command)]
pub async fn voidsession(
    ctx: Context<'_>,
    #[description = "Session id"] session_id: String,
) -> Result<(), Error> {
    if !is_admin(ctx).await {
        ctx.say(format_error_message("This command is restricted to admins."))
            .await?;
        return Ok(());
    }

    let session_id = match Uuid::parse_str(session_id.trim()) {
        Ok(id) => id,
        Err(_) => {
            ctx.say(format_error_message("That is not a valid session id."))
                .await?;
            return Ok(());
        }
    };

    let data = ctx.data();
    let msg = match data.clock.void_session(session_id).await {
        Ok(session) => {
            tracing::info!(
                "Session {} voided by {}",
                session.id,
                ctx.author().id
            );
            format_success_message(&format!(
                "Voided session {} (clocked in {})",
                session.id,
                format_datetime(session.clock_in, &data.offset)
            ))
        }
        Err(e) => format_error_message(&describe_clock_error(&e)),
    };
    ctx.say(msg).await?;

    Ok(())
}
