use crate::infra::{parse_language, Backend, InMemoryAuthGateway, InMemorySurveyStore};
use chrono::Utc;
use clap::Args;
use csat::config::{AppConfig, SurveyConfig};
use csat::error::AppError;
use csat::survey::{
    AdminSetupForm, AgeGroup, AggregateSummary, AuthGateway, ClearRequest, ClearSelection,
    Credentials, DemographicAnswers, DemographicCriteria, DemographicFilter, DemographicValue,
    DimensionStatistics, EducationLevel, Gender, ItemKey, Language, MaritalStatus,
    PerformanceSort, QuestionPerformance, SurveyService, SurveyServiceError, SurveyStore,
    SurveySubmission,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// Label language for dimensions and questions (en or am)
    #[arg(long, value_parser = parse_language, default_value = "en")]
    pub(crate) language: Language,
    /// Print the raw summary document as JSON instead of a report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Label language for the demo output (en or am)
    #[arg(long, value_parser = parse_language, default_value = "en")]
    pub(crate) language: Language,
    /// Directory to write the demo workbook and raw CSV into
    #[arg(long)]
    pub(crate) export_dir: Option<PathBuf>,
}

pub(crate) async fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    match Backend::from_config(&config) {
        Backend::Hosted(service) => print_summary(&service, &args).await,
        Backend::Local(service) => print_summary(&service, &args).await,
    }
}

async fn print_summary<S, A>(
    service: &SurveyService<S, A>,
    args: &SummaryArgs,
) -> Result<(), AppError>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let summary = service.overall_summary().await?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    let dimensions = service.dimension_scores(args.language).await?;
    let questions = service
        .question_performance(args.language, PerformanceSort::Asc, None)
        .await?;
    render_dashboard(&summary, &dimensions, &questions, args.language);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        language,
        export_dir,
    } = args;

    let store = Arc::new(InMemorySurveyStore::default());
    let gateway = Arc::new(InMemoryAuthGateway::default());
    let service = SurveyService::new(store, gateway, &SurveyConfig::default());

    println!("Customer satisfaction survey demo");

    let admin = service
        .setup_admin(AdminSetupForm {
            email: "demo-admin@example.org".to_string(),
            password: "demo-pass".to_string(),
            confirm_password: "demo-pass".to_string(),
        })
        .await?;
    let session = service
        .sign_in(&Credentials {
            email: admin.email.clone(),
            password: "demo-pass".to_string(),
        })
        .await?;
    let context = service.authenticate(&session.access_token, language).await?;
    println!("- signed in as {}", context.user.email);

    let seeded = service.seed_samples(&context).await?;
    println!("- seeded {} sample responses", seeded.count);

    let stored = service.submit(demo_submission()).await?;
    println!(
        "- recorded a public submission scoring {:.2} overall",
        stored.overall_score()
    );

    let incomplete = SurveySubmission::from_ratings(
        DemographicAnswers::default(),
        ItemKey::ordered().into_iter().take(5).map(|item| (item, 4)),
    );
    if let Err(err) = service.submit(incomplete).await {
        println!("- rejected an incomplete submission: {err}");
    }

    let summary = service.overall_summary().await?;
    let dimensions = service.dimension_scores(language).await?;
    let questions = service
        .question_performance(language, PerformanceSort::Asc, None)
        .await?;
    println!();
    render_dashboard(&summary, &dimensions, &questions, language);

    if let Some(dir) = export_dir {
        let today = Utc::now().date_naive();
        for file in [
            service.export_workbook(&context, today).await?,
            service.export_raw_csv(&context, today).await?,
        ] {
            let path = dir.join(&file.filename);
            std::fs::write(&path, &file.bytes)?;
            println!("- wrote {} ({} bytes)", path.display(), file.bytes.len());
        }
    }

    let unconfirmed = ClearRequest::new(ClearSelection::All, "delete");
    if let Err(err) = service.clear(&context, &unconfirmed).await {
        println!("\nClear without confirmation refused: {err}");
    }
    let filter = DemographicFilter::new(DemographicCriteria {
        gender: Some(Gender::Male),
        ..DemographicCriteria::default()
    })
    .map_err(SurveyServiceError::from)?;
    let outcome = service
        .clear(
            &context,
            &ClearRequest::new(ClearSelection::Demographics(filter), "DELETE"),
        )
        .await?;
    let remaining = service.overall_summary().await?.total_responses;
    println!(
        "Cleared {} responses from male respondents; {} remain",
        outcome.count, remaining
    );

    service.sign_out(&session.access_token).await?;
    Ok(())
}

fn demo_submission() -> SurveySubmission {
    SurveySubmission::from_ratings(
        DemographicAnswers {
            gender: Some(Gender::Female),
            age: Some(AgeGroup::From18To30),
            marital_status: Some(MaritalStatus::Single),
            education_level: Some(EducationLevel::Certificate),
        },
        ItemKey::ordered()
            .into_iter()
            .enumerate()
            .map(|(index, item)| (item, 3 + (index % 3) as i64)),
    )
}

pub(crate) fn render_dashboard(
    summary: &AggregateSummary,
    dimensions: &[DimensionStatistics],
    questions: &[QuestionPerformance],
    language: Language,
) {
    let pick = |en, am| language.pick(en, am);

    println!("{}", pick("Customer satisfaction dashboard", "የደንበኛ እርካታ ዳሽቦርድ"));
    println!(
        "- {}: {} | CSAT {:.2}/5 | {} {:.1}%",
        pick("Responses", "ምላሾች"),
        summary.total_responses,
        summary.overall_csat,
        pick("response rate", "የምላሽ መጠን"),
        summary.response_rate * 100.0
    );

    if summary.total_responses == 0 {
        println!("{}", pick("No responses recorded yet.", "እስካሁን ምንም ምላሽ የለም።"));
        return;
    }

    println!("{}:", pick("Dimensions", "ልኬቶች"));
    for stats in dimensions {
        println!(
            "  - {}: mean {:.2} | min {:.2} | max {:.2} | sd {:.2} | n={}",
            stats.label, stats.mean, stats.min, stats.max, stats.std_dev, stats.count
        );
    }

    let lowest: Vec<&QuestionPerformance> = questions.iter().take(3).collect();
    if !lowest.is_empty() {
        println!("{}:", pick("Lowest rated questions", "ዝቅተኛ ውጤት ያገኙ ጥያቄዎች"));
        for row in lowest {
            println!(
                "  - [{}] {}: {:.2} ({})",
                row.item.id(),
                row.text,
                row.mean,
                row.level.label(language)
            );
        }
    }

    println!("{}:", pick("Respondents by gender", "ምላሽ ሰጪዎች በፆታ"));
    for (gender, count) in summary.demographic_counts.gender.iter() {
        println!("  - {}: {}", gender.label(language), count);
    }

    if let Some(latest) = summary.recent_responses.first() {
        println!(
            "{}: {}",
            pick("Latest response", "የመጨረሻ ምላሽ"),
            latest.created_at().format("%Y-%m-%d %H:%M UTC")
        );
    }
}
