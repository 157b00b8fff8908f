use crate::bot::{Context, Error};
use crate::timeclock::RequestContext;
use crate::utils::format::{describe_clock_error, format_error_message, format_success_message};
use crate::utils::time::{delta_to_hours, format_hours, format_time};

/// Start a break in the current session
#[poise::command(slash_command)]
pub async fn breakstart(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let result = match data.employee_for(ctx.author()).await {
        Ok(employee) => data.clock.start_break(RequestContext::now(employee.id)).await,
        Err(e) => Err(e),
    };

    let msg = match result {
        Ok(entry) => format_success_message(&format!(
            "Break started at {}",
            format_time(entry.start, &data.offset)
        )),
        Err(e) => format_error_message(&describe_clock_error(&e)),
    };
    ctx.say(msg).await?;

    Ok(())
}

/// End the running break
#[poise::command(slash_command)]
pub async fn breakend(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let result = match data.employee_for(ctx.author()).await {
        Ok(employee) => data.clock.end_break(RequestContext::now(employee.id)).await,
        Err(e) => Err(e),
    };

    let msg = match result {
        Ok(entry) => format_success_message(&format!(
            "Break ended at {} ({})",
            entry
                .end
                .map(|t| format_time(t, &data.offset))
                .unwrap_or_default(),
            format_hours(entry.duration().map(delta_to_hours).unwrap_or_default())
        )),
        Err(e) => format_error_message(&describe_clock_error(&e)),
    };
    ctx.say(msg).await?;

    Ok(())
}
