use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use thiserror::Error;

use crate::models::{ErrorBody, NewTaskRequest, Task, TaskPatch};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("http {status}: {}", .msg.as_deref().unwrap_or("no message"))]
    Http { status: u16, msg: Option<String> },

    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// The four task operations the client performs.
pub trait TaskApi {
    fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    fn create_task(&self, req: &NewTaskRequest) -> Result<Task, ClientError>;
    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ClientError>;
    fn delete_task(&self, id: &str) -> Result<(), ClientError>;
}

pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().build()?,
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/api/tasks/{}", self.base_url, id)
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

impl TaskApi for HTTPClient {
    fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let resp = self.client.get(self.tasks_url()).send()?;
        Ok(check(resp)?.json::<Vec<Task>>()?)
    }

    fn create_task(&self, req: &NewTaskRequest) -> Result<Task, ClientError> {
        let resp = self
            .client
            .post(self.tasks_url())
            .headers(Self::json_headers())
            .json(req)
            .send()?;
        Ok(check(resp)?.json::<Task>()?)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ClientError> {
        let resp = self
            .client
            .patch(self.task_url(id))
            .headers(Self::json_headers())
            .json(patch)
            .send()?;
        Ok(check(resp)?.json::<Task>()?)
    }

    fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let resp = self.client.delete(self.task_url(id)).send()?;
        check(resp)?;
        Ok(())
    }
}

fn check(resp: Response) -> Result<Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    let msg = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|err| err.msg)
        .filter(|msg| !msg.is_empty());
    Err(ClientError::Http { status, msg })
}
