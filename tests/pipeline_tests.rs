// Integration tests for the generation pipeline
// A scripted backend stands in for the model CLI so every run is deterministic

#[cfg(test)]
mod pipeline_integration_tests {
    use serde_json::{json, Value};
    use specforge_lib::config::PipelineSettings;
    use specforge_lib::export::ExportPackBuilder;
    use specforge_lib::file_storage::FileArtifactStore;
    use specforge_lib::models::{
        Artifact, ArtifactType, DocumentKind, ExportTarget, Idea, ModuleCategory, ModuleStatus,
        ProjectGraph, ProjectRecord,
    };
    use specforge_lib::orchestrator::{
        BackendError, GenerationBackend, GenerationRequest, Orchestrator, StageOutput,
    };
    use specforge_lib::store::{ArtifactStore, MemoryArtifactStore};
    use specforge_lib::{Pipeline, PipelineError, PipelineResult, RollbackPolicy};
    use std::collections::HashSet;
    use std::future::Future;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn taskflow_idea() -> Idea {
        Idea::new(
            "TaskFlow",
            "teams lack shared task visibility",
            "a shared kanban board",
        )
        .with_core_features(&[
            "Sign Up",
            "Board View",
            "Task Comments",
            "Admin Dashboard",
            "Notification Settings",
        ])
    }

    fn fixture(stage: DocumentKind) -> Value {
        match stage {
            DocumentKind::RequirementsDoc => json!({
                "title": "TaskFlow",
                "version": "1.0",
                "features": [
                    {"title": "Sign Up", "description": "Create an account with email"},
                    {"title": "Board View", "description": "Drag tasks between columns"},
                    {"title": "Task Comments", "description": "Discuss a task with teammates"},
                    {"title": "Admin Dashboard", "description": "Moderate boards and members"},
                    {"title": "Notification Settings", "description": "Choose which emails to receive"}
                ],
                "lastUpdated": "2024-01-01T00:00:00Z"
            }),
            DocumentKind::BackendSpec => json!({
                "overview": "REST API backed by Postgres",
                "entities": [
                    {
                        "name": "User",
                        "fields": [
                            {"name": "id", "type": "uuid", "primaryKey": true},
                            {"name": "email", "type": "string"}
                        ],
                        "relations": [{"target": "Task", "cardinality": "one-to-many", "label": "owns"}]
                    },
                    {
                        "name": "Task",
                        "fields": [
                            {"name": "id", "type": "uuid", "primaryKey": true},
                            {"name": "title", "type": "string"}
                        ]
                    }
                ],
                "endpoints": [
                    {"method": "POST", "path": "/signup", "description": "Register"},
                    {"method": "GET", "path": "/boards/:id", "description": "Load a board", "authRequired": true}
                ]
            }),
            DocumentKind::FrontendSpec => json!({
                "framework": "React",
                "stateManagement": "Zustand",
                "pages": [
                    {"name": "Board", "route": "/board", "description": "Columns of tasks"}
                ]
            }),
            DocumentKind::UiSpec => json!({
                "colorPalette": [{"name": "primary", "hex": "#3366FF"}],
                "screens": [{"name": "Board", "purpose": "Track tasks"}]
            }),
        }
    }

    /// Backend answering every stage with a fixture, optionally failing or stalling one
    #[derive(Default)]
    struct ScriptedBackend {
        fail_stage: Option<DocumentKind>,
        delay: Option<Duration>,
        calls: Mutex<Vec<DocumentKind>>,
    }

    impl ScriptedBackend {
        fn failing_at(stage: DocumentKind) -> Self {
            Self {
                fail_stage: Some(stage),
                ..Self::default()
            }
        }

        fn stalling(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl GenerationBackend for ScriptedBackend {
        fn generate_structured(
            &self,
            request: GenerationRequest,
        ) -> impl Future<Output = Result<Value, BackendError>> + Send {
            async move {
                self.calls.lock().unwrap().push(request.stage);
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                if self.fail_stage == Some(request.stage) {
                    return Err(BackendError::Unavailable("rate limited".to_string()));
                }
                Ok(fixture(request.stage))
            }
        }
    }

    /// Memory store that refuses writes of one artifact type
    struct FailingStore {
        inner: MemoryArtifactStore,
        fail_on: ArtifactType,
    }

    impl ArtifactStore for FailingStore {
        fn create_project(&self, name: &str) -> PipelineResult<ProjectRecord> {
            self.inner.create_project(name)
        }

        fn get_project(&self, project_id: &str) -> PipelineResult<ProjectRecord> {
            self.inner.get_project(project_id)
        }

        fn list_projects(&self) -> PipelineResult<Vec<ProjectRecord>> {
            self.inner.list_projects()
        }

        fn delete_project(&self, project_id: &str) -> PipelineResult<()> {
            self.inner.delete_project(project_id)
        }

        fn upsert(
            &self,
            project_id: &str,
            artifact_type: ArtifactType,
            content: &str,
        ) -> PipelineResult<u32> {
            if artifact_type == self.fail_on {
                return Err(PipelineError::persistence(artifact_type.to_string(), "disk full"));
            }
            self.inner.upsert(project_id, artifact_type, content)
        }

        fn get(&self, project_id: &str, artifact_type: ArtifactType) -> PipelineResult<Artifact> {
            self.inner.get(project_id, artifact_type)
        }

        fn list(&self, project_id: &str) -> PipelineResult<Vec<Artifact>> {
            self.inner.list(project_id)
        }

        fn save_graph(&self, project_id: &str, graph: &ProjectGraph) -> PipelineResult<()> {
            self.inner.save_graph(project_id, graph)
        }

        fn load_graph(&self, project_id: &str) -> PipelineResult<ProjectGraph> {
            self.inner.load_graph(project_id)
        }
    }

    fn pipeline_with(
        backend: ScriptedBackend,
        store: Arc<dyn ArtifactStore>,
        settings: PipelineSettings,
    ) -> Pipeline<ScriptedBackend> {
        Pipeline::new(
            Orchestrator::with_backend(Arc::new(backend)),
            store,
            ExportPackBuilder::new().unwrap(),
            settings,
        )
    }

    fn memory_pipeline(backend: ScriptedBackend) -> (Pipeline<ScriptedBackend>, String) {
        let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
        let project = store.create_project("TaskFlow").unwrap();
        (
            pipeline_with(backend, store, PipelineSettings::default()),
            project.id,
        )
    }

    #[tokio::test]
    async fn test_taskflow_end_to_end() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let report = pipeline
            .run(&project_id, &taskflow_idea(), None)
            .await
            .unwrap();

        assert!(report.is_fully_persisted());
        assert!(report.graph_saved);
        assert_eq!(report.bundle.requirements_doc.features.len(), 5);

        let placement = |label: &str| {
            let node = report
                .graph
                .nodes
                .iter()
                .find(|n| n.label == label)
                .unwrap();
            (node.category, node.layer, node.sequence_in_layer)
        };
        assert_eq!(placement("Sign Up"), (ModuleCategory::Authentication, 1, 1));
        assert_eq!(placement("Board View"), (ModuleCategory::Core, 2, 1));
        assert_eq!(placement("Task Comments"), (ModuleCategory::Core, 2, 2));
        assert_eq!(placement("Admin Dashboard").1, 4);
        assert_eq!(placement("Admin Dashboard").2, 1);
        assert_eq!(placement("Notification Settings").1, 5);
        assert_eq!(placement("Notification Settings").2, 1);

        let sign_up = report.graph.nodes.iter().find(|n| n.label == "Sign Up").unwrap();
        let board = report.graph.nodes.iter().find(|n| n.label == "Board View").unwrap();
        assert!(report
            .graph
            .edges
            .iter()
            .any(|e| e.source == sign_up.id && e.target == board.id));
    }

    #[tokio::test]
    async fn test_run_persists_every_artifact_in_order() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let report = pipeline
            .run(&project_id, &taskflow_idea(), None)
            .await
            .unwrap();

        let written: Vec<ArtifactType> = report.written.iter().map(|(t, _)| *t).collect();
        let mut expected = vec![
            ArtifactType::RequirementsDoc,
            ArtifactType::BackendSpec,
            ArtifactType::FrontendSpec,
            ArtifactType::UiSpec,
            ArtifactType::FlowDiagram,
            ArtifactType::ErDiagram,
        ];
        expected.extend(ExportTarget::ALL.into_iter().map(ArtifactType::ExportPack));
        assert_eq!(written, expected);
        assert!(report.written.iter().all(|(_, v)| *v == 1));

        let store = pipeline.store();
        let flow = store.get(&project_id, ArtifactType::FlowDiagram).unwrap();
        assert!(flow.content.starts_with("flowchart TD"));
        assert!(flow.content.contains("module_1 -->|requires user| module_2"));

        let erd = store.get(&project_id, ArtifactType::ErDiagram).unwrap();
        assert!(erd.content.contains("User ||--o{ Task"));

        let claude = store
            .get(&project_id, ArtifactType::ExportPack(ExportTarget::Claude))
            .unwrap();
        assert!(claude.content.contains("TaskFlow"));
        assert!(claude.content.contains("## Build order"));

        assert_eq!(store.load_graph(&project_id).unwrap(), report.graph);
    }

    #[tokio::test]
    async fn test_rerun_bumps_store_versions() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let idea = taskflow_idea();

        pipeline.run(&project_id, &idea, None).await.unwrap();
        let second = pipeline.run(&project_id, &idea, None).await.unwrap();

        assert_eq!(second.version_of(ArtifactType::RequirementsDoc), Some(2));
        assert_eq!(second.version_of(ArtifactType::FlowDiagram), Some(2));
        let stored = pipeline
            .store()
            .get(&project_id, ArtifactType::UiSpec)
            .unwrap();
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_unknown_project_fails_before_generation() {
        let (pipeline, _) = memory_pipeline(ScriptedBackend::default());
        let err = pipeline
            .run("no-such-project", &taskflow_idea(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { kind: "Project", .. }));
        assert_eq!(pipeline.orchestrator().backend().call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_idea_is_rejected_without_side_effects() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let idea = Idea::new("", "teams lack shared task visibility", "a shared kanban board");

        let err = pipeline.run(&project_id, &idea, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(pipeline.orchestrator().backend().call_count(), 0);
        assert!(pipeline.store().list(&project_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_project_by_default() {
        let (pipeline, project_id) =
            memory_pipeline(ScriptedBackend::failing_at(DocumentKind::FrontendSpec));

        let err = pipeline
            .run(&project_id, &taskflow_idea(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Generation {
                stage: DocumentKind::FrontendSpec,
                ..
            }
        ));
        assert!(pipeline.store().project_exists(&project_id));
        assert!(pipeline.store().list(&project_id).unwrap().is_empty());
        assert!(pipeline.store().load_graph(&project_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_can_delete_project() {
        let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
        let project = store.create_project("TaskFlow").unwrap();
        let settings = PipelineSettings {
            rollback: RollbackPolicy::DeleteProject,
            ..PipelineSettings::default()
        };
        let pipeline = pipeline_with(
            ScriptedBackend::failing_at(DocumentKind::RequirementsDoc),
            store.clone(),
            settings,
        );

        let err = pipeline
            .run(&project.id, &taskflow_idea(), None)
            .await
            .unwrap_err();
        assert!(err.is_generation_failure());
        assert!(!store.project_exists(&project.id));
        // Stage 2 never starts when stage 1 fails
        assert_eq!(pipeline.orchestrator().backend().call_count(), 1);
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_a_timeout() {
        let store: Arc<dyn ArtifactStore> = Arc::new(MemoryArtifactStore::new());
        let project = store.create_project("TaskFlow").unwrap();
        let settings = PipelineSettings {
            rollback: RollbackPolicy::DeleteProject,
            ..PipelineSettings::default()
        };
        let pipeline = pipeline_with(
            ScriptedBackend::stalling(Duration::from_secs(5)),
            store.clone(),
            settings,
        );

        let err = pipeline
            .run(&project.id, &taskflow_idea(), Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(!store.project_exists(&project.id));
    }

    #[tokio::test]
    async fn test_default_deadline_applies_when_none_given() {
        let (pipeline, project_id) =
            memory_pipeline(ScriptedBackend::stalling(Duration::from_secs(5)));
        let pipeline = pipeline.with_default_deadline(Duration::from_millis(30));

        let err = pipeline
            .run(&project_id, &taskflow_idea(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_persistence_failure_reports_partial_writes() {
        let store: Arc<dyn ArtifactStore> = Arc::new(FailingStore {
            inner: MemoryArtifactStore::new(),
            fail_on: ArtifactType::UiSpec,
        });
        let project = store.create_project("TaskFlow").unwrap();
        let pipeline = pipeline_with(
            ScriptedBackend::default(),
            store.clone(),
            PipelineSettings::default(),
        );

        let report = pipeline
            .run(&project.id, &taskflow_idea(), None)
            .await
            .unwrap();
        assert!(!report.is_fully_persisted());
        assert!(report.graph_saved);

        let written: Vec<ArtifactType> = report.written.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            written,
            vec![
                ArtifactType::RequirementsDoc,
                ArtifactType::BackendSpec,
                ArtifactType::FrontendSpec,
            ]
        );

        let stored: HashSet<ArtifactType> = store
            .list(&project.id)
            .unwrap()
            .into_iter()
            .map(|a| a.artifact_type)
            .collect();
        assert_eq!(stored.len(), 3);
        assert!(!stored.contains(&ArtifactType::FlowDiagram));

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn test_regenerate_backend_spec_refreshes_erd() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let idea = taskflow_idea();
        pipeline.run(&project_id, &idea, None).await.unwrap();

        let update = pipeline
            .regenerate_stage(&project_id, DocumentKind::BackendSpec, &idea)
            .await
            .unwrap();
        assert!(matches!(update.output, StageOutput::Backend(_)));
        assert_eq!(
            update.written,
            vec![(ArtifactType::BackendSpec, 2), (ArtifactType::ErDiagram, 2)]
        );
        let frontend = pipeline
            .store()
            .get(&project_id, ArtifactType::FrontendSpec)
            .unwrap();
        assert_eq!(frontend.version, 1);
    }

    #[tokio::test]
    async fn test_regenerate_requirements_bumps_document_version() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let idea = taskflow_idea();
        pipeline.run(&project_id, &idea, None).await.unwrap();

        let update = pipeline
            .regenerate_stage(&project_id, DocumentKind::RequirementsDoc, &idea)
            .await
            .unwrap();
        match update.output {
            StageOutput::Requirements(doc) => assert_eq!(doc.version, "1.1"),
            other => panic!("unexpected output: {:?}", other.kind()),
        }
        assert_eq!(update.written, vec![(ArtifactType::RequirementsDoc, 2)]);
    }

    #[tokio::test]
    async fn test_regenerate_spec_without_requirements_is_not_found() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let err = pipeline
            .regenerate_stage(&project_id, DocumentKind::UiSpec, &taskflow_idea())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { kind: "Artifact", .. }));
        assert_eq!(pipeline.orchestrator().backend().call_count(), 0);
    }

    #[tokio::test]
    async fn test_hand_edited_graph_replaces_flow_diagram() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let report = pipeline
            .run(&project_id, &taskflow_idea(), None)
            .await
            .unwrap();

        let mut graph = report.graph.clone();
        graph.set_status("module-4", ModuleStatus::Out).unwrap();
        let update = pipeline.update_graph(&project_id, graph).unwrap();

        assert_eq!(update.flow_diagram_version, 2);
        assert!(update.collisions.is_empty());
        let flow = pipeline
            .store()
            .get(&project_id, ArtifactType::FlowDiagram)
            .unwrap();
        assert!(flow.content.contains("class module_4 statusOut"));
        assert_eq!(
            pipeline.store().load_graph(&project_id).unwrap().node("module-4").unwrap().status,
            ModuleStatus::Out
        );
    }

    #[tokio::test]
    async fn test_broken_graph_edit_is_rejected() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        let report = pipeline
            .run(&project_id, &taskflow_idea(), None)
            .await
            .unwrap();

        let mut graph = report.graph.clone();
        graph.nodes.retain(|n| n.id != "module-1");
        let err = pipeline.update_graph(&project_id, graph).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(pipeline.store().load_graph(&project_id).unwrap(), report.graph);
    }

    #[tokio::test]
    async fn test_regenerate_graph_and_rebuild_exports() {
        let (pipeline, project_id) = memory_pipeline(ScriptedBackend::default());
        pipeline
            .run(&project_id, &taskflow_idea(), None)
            .await
            .unwrap();

        let update = pipeline.regenerate_graph(&project_id).unwrap();
        assert_eq!(update.graph.nodes.len(), 5);
        assert_eq!(update.flow_diagram_version, 2);

        let written = pipeline.rebuild_exports(&project_id).unwrap();
        assert_eq!(written.len(), ExportTarget::ALL.len());
        assert!(written.iter().all(|(_, v)| *v == 2));
    }

    #[tokio::test]
    async fn test_file_store_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(dir.path()));
        let project = store.create_project("TaskFlow").unwrap();
        let pipeline = pipeline_with(
            ScriptedBackend::default(),
            store.clone(),
            PipelineSettings {
                export_targets: vec![ExportTarget::Cursor],
                ..PipelineSettings::default()
            },
        );

        let report = pipeline
            .run(&project.id, &taskflow_idea(), None)
            .await
            .unwrap();
        assert!(report.is_fully_persisted());
        assert_eq!(report.written.len(), 7);

        // A second store over the same directory sees everything
        let reopened = FileArtifactStore::new(dir.path());
        assert_eq!(reopened.load_graph(&project.id).unwrap(), report.graph);
        let pack = reopened
            .get(&project.id, ArtifactType::ExportPack(ExportTarget::Cursor))
            .unwrap();
        assert_eq!(pack.version, 1);
        assert_eq!(reopened.list(&project.id).unwrap().len(), 7);
    }
}
