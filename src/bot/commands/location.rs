use crate::bot::{Context, Error};
use crate::timeclock::RequestContext;
use crate::utils::format::{describe_clock_error, format_error_message, format_success_message};
use crate::utils::validation::validate_coordinates;

/// Share your current location for the open session
#[poise::command(slash_command)]
pub async fn location(
    ctx: Context<'_>,
    #[description = "Latitude"] latitude: f64,
    #[description = "Longitude"] longitude: f64,
) -> Result<(), Error> {
    let data = ctx.data();

    let coordinates = match validate_coordinates(latitude, longitude) {
        Ok(coordinates) => coordinates,
        Err(e) => {
            ctx.say(format_error_message(&e.to_string())).await?;
            return Ok(());
        }
    };

    let result = match data.employee_for(ctx.author()).await {
        Ok(employee) => {
            data.clock
                .record_location(RequestContext::now(employee.id), coordinates)
                .await
        }
        Err(e) => Err(e),
    };

    let msg = match result {
        Ok(sample) => format_success_message(&format!("Location recorded: {}", sample.address)),
        Err(e) => format_error_message(&describe_clock_error(&e)),
    };
    ctx.say(msg).await?;

    Ok(())
}
