use crate::{crawler::Params, Dispatcher};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// An inbound request to process one link on behalf of a user.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Event {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Response {
    fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Dispatches the event's link and runs the matching crawler.
pub async fn handle(dispatcher: &Dispatcher, event: &Event) -> Response {
    let (Some(user), Some(link)) = (non_empty(&event.user), non_empty(&event.link)) else {
        error!("Missing required fields");
        return Response::new(400, "User or link is missing");
    };

    let crawler = match dispatcher.get_crawler(link) {
        Ok(Some(crawler)) => crawler,
        Ok(None) => {
            warn!("No crawler found for link: {}", link);
            return Response::new(404, "No suitable crawler found");
        }
        Err(e) => {
            error!("Error processing link {}: {}", link, e);
            return Response::new(500, format!("An error occurred: {}", e));
        }
    };

    let params = Params::new().with("user", user);
    match crawler.extract_information(link, &params).await {
        Ok(()) => {
            info!("Successfully processed link for user: {}", user);
            Response::new(200, "Link processed successfully")
        }
        Err(e) => {
            error!("Error processing link {} with {}: {}", link, crawler.name(), e);
            Response::new(500, format!("An error occurred: {}", e))
        }
    }
}
