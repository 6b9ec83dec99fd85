// Conversation Dispatcher
// Routes a question to the QA endpoint matching the selected project

use crate::models::{ChatReply, Project, ProjectType};
use crate::services::backend::{JobApi, JobError, JobResult, QaTarget};
use crate::utils::shared_store::validate_question;

/// Collection marker that puts the backend in free conversation mode
pub const GENERAL_COLLECTION: &str = "";

/// Resolved destination of a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRoute {
    pub target: QaTarget,
    pub collection_name: String,
}

/// Pick the endpoint and collection for a question
pub fn route_question(project: Option<&Project>) -> QueryRoute {
    match project {
        None => QueryRoute {
            target: QaTarget::Code,
            collection_name: GENERAL_COLLECTION.to_string(),
        },
        Some(project) => QueryRoute {
            target: match project.project_type {
                ProjectType::Log => QaTarget::Log,
                ProjectType::Code => QaTarget::Code,
            },
            collection_name: project.collection_name.clone(),
        },
    }
}

/// Sends questions for the current project
pub struct ConversationDispatcher<'a> {
    api: &'a dyn JobApi,
}

impl<'a> ConversationDispatcher<'a> {
    pub fn new(api: &'a dyn JobApi) -> Self {
        Self { api }
    }

    pub async fn ask(&self, project: Option<&Project>, question: &str) -> JobResult<ChatReply> {
        validate_question(question).map_err(|message| JobError::InvalidInput { message })?;

        let route = route_question(project);
        log::debug!(
            "Routing question to {:?} (collection '{}')",
            route.target,
            route.collection_name
        );

        let response = self
            .api
            .ask(route.target, &route.collection_name, question.trim())
            .await?;
        Ok(ChatReply::from(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::poller::testing::ScriptedApi;

    #[tokio::test]
    async fn test_no_project_uses_general_mode() {
        let api = ScriptedApi::new(Vec::new());
        let reply = ConversationDispatcher::new(&api)
            .ask(None, "hello")
            .await
            .unwrap();

        assert_eq!(
            api.asked(),
            vec![(QaTarget::Code, String::new(), "hello".to_string())]
        );
        // Conversation answers carry no citations
        assert!(reply.is_conversation);
        assert!(reply.sources.is_empty());
    }

    #[tokio::test]
    async fn test_log_project_uses_log_endpoint() {
        let api = ScriptedApi::new(Vec::new());
        let project = Project::from_ingest(
            "job-1".to_string(),
            "nginx".to_string(),
            ProjectType::Log,
            Some("nginx_logs_91".to_string()),
        );

        let reply = ConversationDispatcher::new(&api)
            .ask(Some(&project), "why 502?")
            .await
            .unwrap();

        let asked = api.asked();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].0, QaTarget::Log);
        assert_eq!(asked[0].1, "nginx_logs_91");
        assert_eq!(reply.sources, vec!["src/main.rs".to_string()]);
    }

    #[test]
    fn test_code_project_route() {
        let project = Project::from_ingest(
            "job-1".to_string(),
            "api".to_string(),
            ProjectType::Code,
            Some("api_3c".to_string()),
        );
        assert_eq!(
            route_question(Some(&project)),
            QueryRoute {
                target: QaTarget::Code,
                collection_name: "api_3c".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let api = ScriptedApi::new(Vec::new());
        let err = ConversationDispatcher::new(&api)
            .ask(None, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidInput { .. }));
        assert!(api.asked().is_empty());
    }
}
