//! Application context - builds the clients each command needs

use std::sync::Arc;

use anyhow::Context as _;
use weekplan_core::{
    CalendarWorkspace, PipelineSettings, PlanPipeline, PlanningService, TimetableSource,
};
use weekplan_domain::AppConfig;
use weekplan_infra::{
    GoogleAuth, GoogleWorkspaceClient, HttpClient, OpenAIClient, TimetableClient,
};

/// Loaded configuration plus the shared HTTP client
///
/// Each accessor validates only the section its client needs, so commands
/// that never touch the planner run without an API key.
pub struct AppContext {
    pub config: AppConfig,
    http_client: HttpClient,
}

impl AppContext {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let http_client = HttpClient::new().context("failed to build HTTP client")?;
        Ok(Self { config, http_client })
    }

    pub fn timetable(&self) -> anyhow::Result<TimetableClient> {
        self.config.timetable.validate()?;
        Ok(TimetableClient::new(&self.config.timetable, self.http_client.clone()))
    }

    pub fn workspace(&self) -> anyhow::Result<GoogleWorkspaceClient> {
        self.config.google.validate()?;
        let auth = GoogleAuth::from_config(&self.config.google, self.http_client.clone())?;
        Ok(GoogleWorkspaceClient::new(
            self.http_client.clone(),
            Arc::new(auth),
            &self.config.google,
        ))
    }

    pub fn planner(&self) -> anyhow::Result<OpenAIClient> {
        self.config.planner.validate()?;
        Ok(OpenAIClient::from_config(&self.config.planner, self.http_client.clone())?)
    }

    /// Fully wired pipeline; validates every section up front
    pub fn pipeline(&self) -> anyhow::Result<PlanPipeline> {
        self.config.validate().context("invalid configuration")?;
        let timetable: Arc<dyn TimetableSource> = Arc::new(self.timetable()?);
        let workspace: Arc<dyn CalendarWorkspace> = Arc::new(self.workspace()?);
        let planner: Arc<dyn PlanningService> = Arc::new(self.planner()?);
        let settings = PipelineSettings::from_config(&self.config);
        Ok(PlanPipeline::new(timetable, workspace, planner, settings))
    }
}
