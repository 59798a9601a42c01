//! Task templates: one prompt per stage, bound to the agent that runs it.

use archsmith_tools::FILE_WRITER_TOOL;
use archsmith_utils::types::StageId;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::agents::AgentKind;
use crate::result::Specification;
use crate::scanner::ProjectStructure;
use crate::spec_parser::{BACKEND_HEADER, FRONTEND_HEADER};

/// A prompt for one stage, ready to hand to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSpec {
    pub stage: StageId,
    pub agent: AgentKind,
    /// Correlates log lines and model calls of one workflow run
    pub run_id: String,
    pub description: String,
    pub expected_output: String,
}

impl TaskSpec {
    fn new(stage: StageId, agent: AgentKind, description: String, expected_output: &str) -> Self {
        Self {
            stage,
            agent,
            run_id: String::new(),
            description,
            expected_output: expected_output.to_string(),
        }
    }

    #[must_use]
    pub fn for_run(mut self, run_id: &str) -> Self {
        self.run_id = run_id.to_string();
        self
    }

    /// Text of the user turn sent to the model.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "{}\n\nEXPECTED OUTPUT:\n{}",
            self.description.trim(),
            self.expected_output.trim()
        )
    }

    /// Coordinator turns the brief into backend and frontend specifications.
    #[must_use]
    pub fn specification(brief: &str) -> Self {
        let description = format!(
            r#"Analyze the following project brief and create detailed, technology-agnostic technical specifications.

PROJECT BRIEF: {brief}

ANALYSIS APPROACH:
1. Identify core domain entities and their relationships
2. Determine required user roles and permissions
3. Define data models and business logic requirements
4. Specify API endpoints needed for frontend-backend communication
5. Identify frontend components and user interface requirements

SPECIFICATION GUIDELINES:
- Keep specifications technology-agnostic where possible
- Focus on functionality rather than implementation details
- Keep the frontend and backend specifications aligned
- Consider scalability and maintainability

OUTPUT FORMAT (use these headings exactly):

---

## Technical Specifications for: "{brief}"

### PROJECT ANALYSIS
[Brief overview of the project domain and key requirements]

{BACKEND_HEADER}
[Backend specification covering data models and relationships, API endpoint
requirements, authentication and authorization needs, business logic workflows]

{FRONTEND_HEADER}
[Frontend specification covering user interface components, user interaction
flows, state management requirements, API integration points]

---"#
        );
        Self::new(
            StageId::Specification,
            AgentKind::Coordinator,
            description,
            "Comprehensive technical specifications with clearly separated BACKEND_SPEC and \
             FRONTEND_SPEC sections, following the requested markdown structure.",
        )
    }

    /// Backend specialist generates the `backend/` tree.
    #[must_use]
    pub fn backend(backend_spec: &str) -> Self {
        let description = format!(
            r#"Based on the following backend specification, generate complete, production-ready backend code.

BACKEND SPECIFICATION:
{backend_spec}

TECHNOLOGY RECOMMENDATIONS (adjust to the specification):
- FastAPI for REST APIs
- SQLAlchemy for the database ORM
- Pydantic for data validation
- JWT for authentication when needed

IMPLEMENTATION REQUIREMENTS:
1. Analyze the specification to determine the architecture
2. Design database models from the domain entities
3. Create API endpoints with request and response validation
4. Implement business logic and data access layers
5. Add authentication and authorization if the specification requires it
6. Include error handling and validation
7. Generate requirements.txt with the necessary dependencies

FILE GENERATION:
- Use the {FILE_WRITER_TOOL} tool for ALL files, with subfolder "backend"
- Structure files logically (models, routes, services, and so on)
- Match the architecture to the project complexity

Return a summary of the backend architecture: database models, API endpoints, authentication strategy and file structure."#
        );
        Self::new(
            StageId::Backend,
            AgentKind::Backend,
            description,
            "Summary of the generated backend architecture including key models, endpoints, \
             authentication approach, and file organization.",
        )
    }

    /// Frontend specialist generates the `frontend/` tree against the backend API.
    #[must_use]
    pub fn frontend(frontend_spec: &str, api_structure: &str) -> Self {
        let description = format!(
            r#"Based on the following specifications, generate a complete, modern React frontend application.

FRONTEND SPECIFICATION:
{frontend_spec}

BACKEND API STRUCTURE (for integration reference):
{api_structure}

TECHNOLOGY REQUIREMENTS:
- React with TypeScript
- Tailwind CSS for styling
- State management with React Context or hooks
- An API service layer for backend communication
- Routing if needed (React Router)
- Responsive design

FILE GENERATION GUIDELINES:
1. Analyze the specification to determine the file structure
2. Create modular components for the project's domain
3. Generate API services that match the backend API structure
4. Implement state management appropriate for the application
5. Create a package.json with the required dependencies

MANDATORY ACTIONS:
- Use the {FILE_WRITER_TOOL} tool for EVERY file, with subfolder "frontend"
- Include at minimum package.json, the main App component and the core feature components
- Make the API services match the backend endpoints

Return a summary of the created file structure and how it addresses the project requirements."#
        );
        Self::new(
            StageId::Frontend,
            AgentKind::Frontend,
            description,
            "Summary of the generated React frontend structure including file organization, key \
             components created, state management approach, and API integration strategy.",
        )
    }

    /// Coordinator compares the two stage outputs for mismatches.
    #[must_use]
    pub fn integration(backend_output: &str, frontend_output: &str) -> Self {
        let description = format!(
            r#"Perform a comprehensive integration review between the generated backend and frontend code.

BACKEND CODE SUMMARY:
{backend_output}

FRONTEND CODE SUMMARY:
{frontend_output}

INTEGRATION REVIEW CRITERIA:
1. API COMPATIBILITY: do frontend API calls match backend endpoint expectations?
2. DATA CONSISTENCY: are request and response structures aligned?
3. AUTHENTICATION FLOW: does the auth implementation work end to end?
4. ERROR HANDLING: is error handling consistent across the stack?
5. BUSINESS LOGIC: do frontend workflows match backend capabilities?
6. DATA FLOW: can data move between frontend and backend?

REVIEW APPROACH:
- Identify specific mismatches, line by line where possible
- Provide concrete correction suggestions
- Consider both technical and functional alignment
- Assess overall system coherence

Provide actionable feedback for both backend and frontend adjustments."#
        );
        Self::new(
            StageId::Integration,
            AgentKind::Coordinator,
            description,
            "Integration review containing:\n\
             - Overall integration readiness assessment\n\
             - Specific technical mismatches identified\n\
             - Backend adjustments needed\n\
             - Frontend adjustments needed\n\
             - Priority of fixes (critical/high/medium)",
        )
    }

    /// Reviewer completes the project, guided by a scan of what exists.
    #[must_use]
    pub fn completion(brief: &str, spec: &Specification, structure: &ProjectStructure) -> Self {
        let description = format!(
            r#"Perform an INTELLIGENT PROJECT COMPLETION review for: {brief}

CURRENT PROJECT ANALYSIS:
- Completeness Score: {score}/100
- Missing Architectural Patterns: {missing}
- Backend Structure: {backend}
- Frontend Structure: {frontend}

PROJECT BRIEF: {brief}

ORIGINAL SPECIFICATIONS:
Backend: {backend_spec}
Frontend: {frontend_spec}

COMPLETION STRATEGY:
Analyze the current structure and:
1. Identify missing architectural layers for the project domain
2. Complete partial implementations
3. Replace placeholder code with functional implementations
4. Make sure the generated code works for its intended purpose

Backend completion:
- If routers exist but are empty, implement the endpoint handlers
- If models exist but no services, create the business logic layer
- If schemas exist without validation, add Pydantic validation
- Implement the database operations
- Add authentication if the project requires user management

Frontend completion:
- If components exist but are empty, implement the UI logic
- If services are incomplete, add the API integration
- If state management exists but is unused, connect it to components
- Create missing pages or views for the application flow
- Add TypeScript types and error handling

ACTION PRINCIPLES:
- Analyze WHAT exists before deciding WHAT to create
- Complete existing implementations before creating new files
- Write files with the {FILE_WRITER_TOOL} tool, subfolder "backend" or "frontend"
- Make the current structure functional"#,
            score = structure.analysis.completeness_score,
            missing = format_list(&structure.analysis.missing_patterns),
            backend = categories_json(&structure.backend.categories),
            frontend = categories_json(&structure.frontend.categories),
            backend_spec = spec.backend_spec,
            frontend_spec = spec.frontend_spec,
        );
        Self::new(
            StageId::Review,
            AgentKind::Reviewer,
            description,
            "COMPLETION REPORT:\n\
             1. STRUCTURE ANALYSIS: what the project contained\n\
             2. COMPLETION STRATEGY: how you approached finishing it\n\
             3. IMPLEMENTATIONS ADDED: functionality completed\n\
             4. ARCHITECTURE ENHANCED: missing patterns addressed\n\
             5. FUNCTIONALITY ACHIEVED: what the project can now do\n\
             6. READINESS ASSESSMENT: how complete the project is now",
        )
    }
}

fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join("; ")
    }
}

fn categories_json(categories: &BTreeMap<String, Vec<String>>) -> String {
    serde_json::to_string_pretty(categories).unwrap_or_else(|_| "{}".to_string())
}
