use crate::infra::{parse_date, parse_demographic, parse_language, Backend};
use chrono::{NaiveDate, Utc};
use clap::Args;
use csat::config::{AppConfig, ConfigError};
use csat::error::AppError;
use csat::survey::{
    AdminContext, AgeGroup, AuthGateway, ClearError, ClearRequest, ClearSelection, Credentials,
    DateRange, DemographicCriteria, DemographicFilter, EducationLevel, Gender, Language,
    MaritalStatus, SelectionError, Session, SurveyService, SurveyServiceError, SurveyStore,
};
use std::fs::File;
use std::path::PathBuf;
use tracing::{info, warn};

/// Administrator identity; the password is read from `CSAT_ADMIN_PASSWORD`.
#[derive(Args, Debug)]
pub(crate) struct AdminArgs {
    /// Administrator email address
    #[arg(long)]
    pub(crate) email: String,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) admin: AdminArgs,
    /// Report language (en or am)
    #[arg(long, value_parser = parse_language, default_value = "en")]
    pub(crate) language: Language,
    /// Export the raw responses as CSV instead of the workbook
    #[arg(long)]
    pub(crate) raw: bool,
    /// Output path (defaults to the standard filename in the current directory)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ClearArgs {
    #[command(flatten)]
    pub(crate) admin: AdminArgs,
    /// Delete every response
    #[arg(long, conflicts_with_all = ["from", "to", "gender", "age", "marital_status", "education_level"])]
    pub(crate) all: bool,
    /// First day of the range to delete (YYYY-MM-DD, inclusive)
    #[arg(
        long,
        value_parser = parse_date,
        requires = "to",
        conflicts_with_all = ["gender", "age", "marital_status", "education_level"]
    )]
    pub(crate) from: Option<NaiveDate>,
    /// Last day of the range to delete (YYYY-MM-DD, inclusive)
    #[arg(
        long,
        value_parser = parse_date,
        requires = "from",
        conflicts_with_all = ["gender", "age", "marital_status", "education_level"]
    )]
    pub(crate) to: Option<NaiveDate>,
    #[arg(long, value_parser = parse_demographic::<Gender>)]
    pub(crate) gender: Option<Gender>,
    #[arg(long, value_parser = parse_demographic::<AgeGroup>)]
    pub(crate) age: Option<AgeGroup>,
    #[arg(long, value_parser = parse_demographic::<MaritalStatus>)]
    pub(crate) marital_status: Option<MaritalStatus>,
    #[arg(long, value_parser = parse_demographic::<EducationLevel>)]
    pub(crate) education_level: Option<EducationLevel>,
    /// Must be exactly DELETE
    #[arg(long, default_value = "")]
    pub(crate) confirm: String,
}

impl ClearArgs {
    /// The modes are exclusive at parse time; no mode at all is refused.
    fn selection(&self) -> Result<ClearSelection, SelectionError> {
        if self.all {
            return Ok(ClearSelection::All);
        }
        if let Some(range) = DateRange::from_bounds(self.from, self.to)? {
            return Ok(ClearSelection::DateRange(range));
        }
        DemographicFilter::new(DemographicCriteria {
            gender: self.gender,
            age: self.age,
            marital_status: self.marital_status,
            education_level: self.education_level,
        })
        .map(ClearSelection::Demographics)
    }
}

#[derive(Args, Debug)]
pub(crate) struct SeedArgs {
    #[command(flatten)]
    pub(crate) admin: AdminArgs,
    /// Import responses from this CSV file instead of the built-in samples
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    match Backend::from_config(&config) {
        Backend::Hosted(service) => export(&service, args).await,
        Backend::Local(service) => export(&service, args).await,
    }
}

pub(crate) async fn run_clear(args: ClearArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    match Backend::from_config(&config) {
        Backend::Hosted(service) => clear(&service, args).await,
        Backend::Local(service) => clear(&service, args).await,
    }
}

pub(crate) async fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    match Backend::from_config(&config) {
        Backend::Hosted(service) => seed(&service, args).await,
        Backend::Local(service) => seed(&service, args).await,
    }
}

async fn export<S, A>(service: &SurveyService<S, A>, args: ExportArgs) -> Result<(), AppError>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let (session, context) = sign_in(service, &args.admin, args.language).await?;
    let today = Utc::now().date_naive();
    let exported = if args.raw {
        service.export_raw_csv(&context, today).await
    } else {
        service.export_workbook(&context, today).await
    };
    sign_out(service, &session).await;

    let file = exported?;
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&file.filename));
    std::fs::write(&path, &file.bytes)?;
    println!("Wrote {} ({} bytes)", path.display(), file.bytes.len());
    Ok(())
}

async fn clear<S, A>(service: &SurveyService<S, A>, args: ClearArgs) -> Result<(), AppError>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let selection = args.selection().map_err(SurveyServiceError::from)?;
    let request = ClearRequest::new(selection, args.confirm.clone());
    if !request.is_confirmed() {
        return Err(SurveyServiceError::from(ClearError::Unconfirmed).into());
    }
    let (session, context) = sign_in(service, &args.admin, Language::En).await?;
    let outcome = service.clear(&context, &request).await;
    sign_out(service, &session).await;

    let outcome = outcome?;
    println!("Deleted {} responses ({})", outcome.count, selection.mode());
    Ok(())
}

async fn seed<S, A>(service: &SurveyService<S, A>, args: SeedArgs) -> Result<(), AppError>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let csv = args.csv.as_ref().map(File::open).transpose()?;
    let (session, context) = sign_in(service, &args.admin, Language::En).await?;
    let outcome = match csv {
        Some(file) => service.import_csv(&context, file).await,
        None => service.seed_samples(&context).await,
    };
    sign_out(service, &session).await;

    let outcome = outcome?;
    println!("Inserted {} responses", outcome.count);
    Ok(())
}

async fn sign_in<S, A>(
    service: &SurveyService<S, A>,
    admin: &AdminArgs,
    language: Language,
) -> Result<(Session, AdminContext), AppError>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let password =
        std::env::var("CSAT_ADMIN_PASSWORD").map_err(|_| ConfigError::MissingAdminPassword)?;
    let session = service
        .sign_in(&Credentials {
            email: admin.email.clone(),
            password,
        })
        .await?;
    let context = service.authenticate(&session.access_token, language).await?;
    info!(admin = %context.user.email, "administrator signed in");
    Ok((session, context))
}

/// A failed sign-out is logged; it must not mask the command's own outcome.
async fn sign_out<S, A>(service: &SurveyService<S, A>, session: &Session)
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    if let Err(err) = service.sign_out(&session.access_token).await {
        warn!(error = %err, "administrator sign-out failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryAuthGateway, InMemorySurveyStore};
    use clap::Parser;
    use csat::config::SurveyConfig;
    use std::sync::Arc;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        clear: ClearArgs,
    }

    fn parse(args: &[&str]) -> Result<ClearArgs, clap::Error> {
        let mut argv = vec!["clear", "--email", "admin@example.org"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).map(|harness| harness.clear)
    }

    #[test]
    fn clear_selection_prefers_explicit_modes() {
        let args = parse(&["--all", "--confirm", "DELETE"]).expect("parses");
        assert_eq!(args.selection(), Ok(ClearSelection::All));

        let args = parse(&["--from", "2024-01-01", "--to", "2024-01-31"]).expect("parses");
        assert!(matches!(args.selection(), Ok(ClearSelection::DateRange(_))));

        let args = parse(&["--age", "50+", "--gender", "male"]).expect("parses");
        match args.selection() {
            Ok(ClearSelection::Demographics(filter)) => {
                assert_eq!(filter.criteria().age, Some(AgeGroup::Over50));
                assert_eq!(filter.criteria().gender, Some(Gender::Male));
            }
            other => panic!("unexpected selection: {other:?}"),
        }
    }

    #[test]
    fn clear_without_any_selection_is_refused() {
        let args = parse(&[]).expect("parses");
        assert_eq!(args.selection(), Err(SelectionError::EmptyDemographicFilter));
    }

    #[test]
    fn date_range_and_demographics_are_exclusive() {
        let combined = parse(&[
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--gender",
            "female",
            "--confirm",
            "DELETE",
        ]);
        assert!(combined.is_err());
        assert!(parse(&["--to", "2024-01-31", "--from", "2024-01-01", "--age", "50+"]).is_err());
    }

    #[tokio::test]
    async fn unconfirmed_clear_is_refused_before_sign_in() {
        let service = SurveyService::new(
            Arc::new(InMemorySurveyStore::default()),
            Arc::new(InMemoryAuthGateway::default()),
            &SurveyConfig::default(),
        );
        let args = parse(&["--all", "--confirm", "delete"]).expect("parses");

        let err = clear(&service, args).await.expect_err("refused");
        assert!(matches!(
            err,
            AppError::Survey(SurveyServiceError::Clear(ClearError::Unconfirmed))
        ));
    }

    #[test]
    fn clear_flags_conflict_and_pair() {
        assert!(parse(&["--all", "--gender", "male"]).is_err());
        assert!(parse(&["--from", "2024-01-01"]).is_err());
        assert!(parse(&["--gender", "unknown"]).is_err());
    }
}
