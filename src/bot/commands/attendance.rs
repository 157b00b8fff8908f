use crate::bot::{Context, Error};
use crate::timeclock::RequestContext;
use crate::utils::format::{
    describe_clock_error, format_error_message, format_info_message, format_success_message,
};
use crate::utils::time::{format_hours, format_time};
use crate::utils::validation::validate_optional_coordinates;

/// Start a work session
#[poise::command(slash_command)]
pub async fn clockin(
    ctx: Context<'_>,
    #[description = "Current latitude"] latitude: Option<f64>,
    #[description = "Current longitude"] longitude: Option<f64>,
) -> Result<(), Error> {
    let data = ctx.data();

    let coordinates = match validate_optional_coordinates(latitude, longitude) {
        Ok(coordinates) => coordinates,
        Err(e) => {
            ctx.say(format_error_message(&e.to_string())).await?;
            return Ok(());
        }
    };

    let employee = match data.employee_for(ctx.author()).await {
        Ok(employee) => employee,
        Err(e) => {
            tracing::error!("Failed to load employee: {:?}", e);
            ctx.say(format_error_message(&describe_clock_error(&e))).await?;
            return Ok(());
        }
    };

    match data
        .clock
        .clock_in(RequestContext::now(employee.id), coordinates)
        .await
    {
        Ok(session) => {
            let msg = format_success_message(&format!(
                "Clocked in at {} ({})",
                format_time(session.clock_in, &data.offset),
                session.clock_in_location
            ));
            ctx.say(msg).await?;
        }
        Err(e) => {
            ctx.say(format_error_message(&describe_clock_error(&e))).await?;
        }
    }

    Ok(())
}

/// End the current work session
#[poise::command(slash_command)]
pub async fn clockout(
    ctx: Context<'_>,
    #[description = "Current latitude"] latitude: Option<f64>,
    #[description = "Current longitude"] longitude: Option<f64>,
) -> Result<(), Error> {
    let data = ctx.data();

    let coordinates = match validate_optional_coordinates(latitude, longitude) {
        Ok(coordinates) => coordinates,
        Err(e) => {
            ctx.say(format_error_message(&e.to_string())).await?;
            return Ok(());
        }
    };

    let employee = match data.employee_for(ctx.author()).await {
        Ok(employee) => employee,
        Err(e) => {
            tracing::error!("Failed to load employee: {:?}", e);
            ctx.say(format_error_message(&describe_clock_error(&e))).await?;
            return Ok(());
        }
    };

    match data
        .clock
        .clock_out(RequestContext::now(employee.id), coordinates)
        .await
    {
        Ok(session) => {
            let mut msg = format_success_message(&format!(
                "Clocked out at {}\nWorked: {}",
                session
                    .clock_out
                    .map(|t| format_time(t, &data.offset))
                    .unwrap_or_default(),
                format_hours(session.total_hours)
            ));

            if session.open_break().is_some() {
                msg.push('\n');
                msg.push_str(&format_info_message(
                    "A break was still running and has not been deducted.",
                ));
            }
            ctx.say(msg).await?;
        }
        Err(e) => {
            ctx.say(format_error_message(&describe_clock_error(&e))).await?;
        }
    }

    Ok(())
}
