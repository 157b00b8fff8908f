use crate::bot::{Context, Error, is_admin};
use crate::utils::format::{create_error_embed, create_info_embed, create_report_embed, describe_clock_error};
use crate::utils::time::{format_hours, local_date, start_of_local_day};
use chrono::{Datelike, Days, NaiveDate};
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ReportPeriod {
    #[name = "daily"]
    Daily,
    #[name = "weekly"]
    Weekly,
    #[name = "monthly"]
    Monthly,
}

impl ReportPeriod {
    fn title(self) -> &'static str {
        match self {
            ReportPeriod::Daily => "Daily report",
            ReportPeriod::Weekly => "Weekly report",
            ReportPeriod::Monthly => "Monthly report",
        }
    }

    /// First local day of the period containing `today`.
    fn first_day(self, today: NaiveDate) -> NaiveDate {
        match self {
            ReportPeriod::Daily => today,
            ReportPeriod::Weekly => {
                let days_since_monday = today.weekday().num_days_from_monday() as u64;
                today
                    .checked_sub_days(Days::new(days_since_monday))
                    .unwrap_or(today)
            }
            ReportPeriod::Monthly => today.with_day(1).unwrap_or(today),
        }
    }
}

/// Show your sessions for today, this week or this month
#[poise::command(slash_command)]
pub async fn report(
    ctx: Context<'_>,
    #[description = "Reporting period"] period: ReportPeriod,
) -> Result<(), Error> {
    let username = ctx.author().name.clone();
    let data = ctx.data();

    let today = local_date(chrono::Utc::now(), &data.offset);
    let first_day = period.first_day(today);
    let from = start_of_local_day(first_day, &data.offset);
    let to = start_of_local_day(today + Days::new(1), &data.offset);

    let sessions = match data.employee_for(ctx.author()).await {
        Ok(employee) => data.clock.sessions_between(employee.id, from, to).await,
        Err(e) => Err(e),
    };

    match sessions {
        Ok(sessions) => {
            let date_range = format!(
                "{} ~ {}",
                first_day.format("%Y-%m-%d"),
                today.format("%Y-%m-%d")
            );
            let embed =
                create_report_embed(&username, period.title(), &date_range, &sessions, &data.offset);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &describe_clock_error(&e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// Total worked hours across all sessions (admins may query other members)
#[poise::command(slash_command)]
pub async fn hours(
    ctx: Context<'_>,
    #[description = "Member to query (admin only)"] member: Option<serenity::User>,
) -> Result<(), Error> {
    let data = ctx.data();
    let target = member.as_ref().unwrap_or_else(|| ctx.author());

    if target.id != ctx.author().id && !is_admin(ctx).await {
        let embed = create_error_embed("Error", "Only admins can view other members' hours.");
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        return Ok(());
    }

    let total = match data.subject_for(ctx.author(), target).await {
        Ok(Some(employee)) => data.clock.total_hours(employee.id).await.map(Some),
        Ok(None) => Ok(None),
        Err(e) => Err(e),
    };

    match total {
        Ok(None) => {
            let embed = create_info_embed(
                "⏱️ Total hours",
                &format!("No sessions recorded for **{}**", target.name),
            );
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Ok(Some(total)) => {
            let embed = create_info_embed(
                "⏱️ Total hours",
                &format!("**{}**: {}", target.name, format_hours(total)),
            );
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            tracing::error!("Failed to aggregate hours for {}: {:?}", target.id, e);
            let embed = create_error_embed("Error", &describe_clock_error(&e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn periods_start_on_expected_days() {
        // 2024-05-15 is a Wednesday.
        let today = date(2024, 5, 15);
        assert_eq!(ReportPeriod::Daily.first_day(today), today);
        assert_eq!(ReportPeriod::Weekly.first_day(today), date(2024, 5, 13));
        assert_eq!(ReportPeriod::Monthly.first_day(today), date(2024, 5, 1));
    }

    #[test]
    fn week_starting_on_monday_is_unchanged() {
        let monday = date(2024, 5, 13);
        assert_eq!(ReportPeriod::Weekly.first_day(monday), monday);
    }
}
