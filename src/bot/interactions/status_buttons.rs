use crate::bot::{Data, Error};
use crate::timeclock::{ClockResult, RequestContext};
use crate::utils::format::{describe_clock_error, format_error_message, format_success_message};
use crate::utils::time::{format_hours, format_time};
use poise::serenity_prelude as serenity;

pub async fn handle_status_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let (action, owner_id) = interaction
        .data
        .custom_id
        .split_once(':')
        .unwrap_or((interaction.data.custom_id.as_str(), ""));

    if owner_id != interaction.user.id.to_string() {
        return respond(ctx, interaction, "These buttons belong to someone else.".to_string()).await;
    }

    let content = match action {
        "break_start" => describe(start_break(interaction, data).await),
        "break_end" => describe(end_break(interaction, data).await),
        "clock_out" => describe(clock_out(interaction, data).await),
        _ => "Unknown action".to_string(),
    };

    respond(ctx, interaction, content).await
}

async fn start_break(interaction: &serenity::ComponentInteraction, data: &Data) -> ClockResult<String> {
    let employee = data.employee_for(&interaction.user).await?;
    let entry = data.clock.start_break(RequestContext::now(employee.id)).await?;
    Ok(format!("Break started at {}", format_time(entry.start, &data.offset)))
}

async fn end_break(interaction: &serenity::ComponentInteraction, data: &Data) -> ClockResult<String> {
    let employee = data.employee_for(&interaction.user).await?;
    let entry = data.clock.end_break(RequestContext::now(employee.id)).await?;
    Ok(format!(
        "Break ended at {}",
        entry
            .end
            .map(|t| format_time(t, &data.offset))
            .unwrap_or_default()
    ))
}

async fn clock_out(interaction: &serenity::ComponentInteraction, data: &Data) -> ClockResult<String> {
    let employee = data.employee_for(&interaction.user).await?;
    let session = data.clock.clock_out(RequestContext::now(employee.id), None).await?;

    let mut msg = format!("Clocked out. Worked: {}", format_hours(session.total_hours));
    if session.open_break().is_some() {
        msg.push_str("\nA break was still running and has not been deducted.");
    }
    Ok(msg)
}

fn describe(result: ClockResult<String>) -> String {
    match result {
        Ok(msg) => format_success_message(&msg),
        Err(e) => format_error_message(&describe_clock_error(&e)),
    }
}

async fn respond(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: String,
) -> Result<(), Error> {
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}
