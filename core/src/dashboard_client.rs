//! Typed client for the dashboard's collaborator endpoints.
//!
//! Activity logging, stats and recommendations. The scenario
//! orchestrator does not depend on any of this.

use crate::{
    config::ClientConfig,
    error::{ScenarioError, ScenarioResult},
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id:               i64,
    pub date:             NaiveDate,
    pub category:         String,
    pub subcategory:      String,
    pub amount:           f64,
    pub unit:             String,
    pub carbon_footprint: f64,
    #[serde(default)]
    pub notes:            Option<String>,
    pub created_at:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub date:        NaiveDate,
    pub category:    String,
    pub subcategory: String,
    pub amount:      f64,
    pub unit:        String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes:       Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date:  NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total:    f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_carbon:       f64,
    pub daily_average:      f64,
    pub activity_count:     u64,
    pub daily_trend:        Vec<DailyTotal>,
    pub category_breakdown: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title:            String,
    pub description:      String,
    pub priority:         String,
    pub potential_saving: f64,
    #[serde(default)]
    pub icon:             Option<String>,
    #[serde(default)]
    pub category:         Option<String>,
}

/// `None` and "All" both mean "no category filter".
pub fn category_filter(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
        .map(str::to_lowercase)
}

pub struct DashboardClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl DashboardClient {
    pub fn new(config: ClientConfig) -> ScenarioResult<Self> {
        Ok(Self { client: config.http_client()?, config })
    }

    pub async fn stats(&self, start: NaiveDate, end: NaiveDate) -> ScenarioResult<DashboardStats> {
        let query = [
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        self.get("/stats", &query).await
    }

    pub async fn activities(&self, category: Option<&str>) -> ScenarioResult<Vec<Activity>> {
        let query: Vec<(&str, String)> = category_filter(category)
            .map(|c| vec![("category", c)])
            .unwrap_or_default();
        self.get("/activities", &query).await
    }

    pub async fn create_activity(&self, activity: &NewActivity) -> ScenarioResult<Activity> {
        let url = self.config.url("/activities");
        let response = self.client.post(&url).json(activity).send().await?;
        Self::read_json(url, response).await
    }

    pub async fn delete_activity(&self, id: i64) -> ScenarioResult<()> {
        let url = self.config.url(&format!("/activities/{id}"));
        let response = self.client.delete(&url).send().await?;
        Self::check(&url, &response)?;
        Ok(())
    }

    pub async fn recommendations(&self) -> ScenarioResult<Vec<Recommendation>> {
        self.get::<Vec<Recommendation>, (&str, String)>("/recommendations", &[]).await
    }

    async fn get<T: DeserializeOwned, Q: Serialize>(&self, path: &str, query: &[Q]) -> ScenarioResult<T> {
        let url = self.config.url(path);
        let response = self.client.get(&url).query(query).send().await?;
        Self::read_json(url, response).await
    }

    async fn read_json<T: DeserializeOwned>(url: String, response: reqwest::Response) -> ScenarioResult<T> {
        Self::check(&url, &response)?;
        Ok(response.json().await?)
    }

    fn check(url: &str, response: &reqwest::Response) -> ScenarioResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ScenarioError::Status { status: status.as_u16(), url: url.to_string() })
        }
    }
}
