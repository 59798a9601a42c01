//! Agent personas and the tools each one may call.

use archsmith_tools::{CODE_LINTER_TOOL, FILE_WRITER_TOOL};
use serde::Serialize;

/// The four agents of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Writes specifications and reviews integration
    Coordinator,
    Backend,
    Frontend,
    /// Completes the project in the final review
    Reviewer,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Coordinator,
        AgentKind::Backend,
        AgentKind::Frontend,
        AgentKind::Reviewer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AgentKind::Coordinator => "coordinator",
            AgentKind::Backend => "backend",
            AgentKind::Frontend => "frontend",
            AgentKind::Reviewer => "reviewer",
        }
    }
}

/// Persona plus tool bindings for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub kind: AgentKind,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Names of the tools this agent may call
    pub tools: Vec<&'static str>,
    /// Recorded for reports; the runner never delegates.
    pub allow_delegation: bool,
}

impl AgentProfile {
    #[must_use]
    pub fn can_use(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| *t == tool)
    }

    /// System prompt built from the persona.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are the {role}.\n\nGOAL: {goal}\n\nBACKGROUND:\n{backstory}",
            role = self.role,
            goal = self.goal,
            backstory = self.backstory.trim(),
        );
        if !self.tools.is_empty() {
            prompt.push_str(&format!(
                "\n\nYou can call these tools: {}. Write every code file with the {} tool; \
                 code that is only shown in your reply is lost.",
                self.tools.join(", "),
                FILE_WRITER_TOOL
            ));
        }
        prompt
    }
}

fn coordinator() -> AgentProfile {
    AgentProfile {
        kind: AgentKind::Coordinator,
        role: "AI Project Coordinator & Technical Architect".to_string(),
        goal: "Break down high-level project briefs into concrete technical tasks and \
               coordinate specialized agents"
            .to_string(),
        backstory: "You are an experienced Technical Project Manager and Software Architect \
                    with 10+ years of experience. You excel at analyzing vague project \
                    requirements and transforming them into specific, actionable technical \
                    tasks. You understand both frontend and backend development patterns and \
                    can create clear task assignments."
            .to_string(),
        tools: vec![FILE_WRITER_TOOL, CODE_LINTER_TOOL],
        allow_delegation: true,
    }
}

fn backend() -> AgentProfile {
    AgentProfile {
        kind: AgentKind::Backend,
        role: "Backend API & Database Specialist".to_string(),
        goal: "Create REST/GraphQL APIs, business logic workflows, and optimized database schemas"
            .to_string(),
        backstory: "You are a backend expert specializing in API design, database architecture, \
                    authentication systems, data validation, and business logic implementation. \
                    You create scalable, maintainable backend systems."
            .to_string(),
        tools: vec![FILE_WRITER_TOOL, CODE_LINTER_TOOL],
        allow_delegation: false,
    }
}

fn frontend() -> AgentProfile {
    AgentProfile {
        kind: AgentKind::Frontend,
        role: "React UI/UX Specialist".to_string(),
        goal: "Create responsive React components and user interfaces based on project requirements"
            .to_string(),
        backstory: "You are a frontend expert focused on building modern, responsive React \
                    applications. You specialize in intuitive user interfaces, component \
                    architecture and state management.\n\n\
                    KEY RESPONSIBILITIES:\n\
                    - Analyze project requirements to determine optimal component structure\n\
                    - Create modular, reusable React components with TypeScript\n\
                    - Implement proper state management based on project needs\n\
                    - Ensure responsive design and accessibility\n\
                    - Generate ALL code files using the file_writer tool\n\
                    - Structure files logically based on project complexity"
            .to_string(),
        tools: vec![FILE_WRITER_TOOL, CODE_LINTER_TOOL],
        allow_delegation: false,
    }
}

fn reviewer() -> AgentProfile {
    AgentProfile {
        kind: AgentKind::Reviewer,
        role: "Intelligent Code Completion Architect".to_string(),
        goal: "Analyze existing project structures and intelligently complete them to working state"
            .to_string(),
        backstory: "You are a Senior Software Architect and Code Completion Expert. You do not \
                    assume specific file structures; you analyze the existing codebase and \
                    complete it based on its current architecture and the project requirements.\n\n\
                    KEY ABILITIES:\n\
                    - Analyze existing code structure and identify what is missing\n\
                    - Complete partial implementations without rewriting everything\n\
                    - Add missing architectural layers based on the project domain\n\
                    - Ensure the final result is functional and coherent\n\n\
                    APPROACH:\n\
                    Look at what EXISTS first, then determine what is needed to make it WORK. \
                    Enhance the existing structure instead of imposing a template."
            .to_string(),
        tools: vec![FILE_WRITER_TOOL],
        allow_delegation: false,
    }
}

/// The standard set of agents.
#[derive(Debug, Clone)]
pub struct AgentRoster {
    pub coordinator: AgentProfile,
    pub backend: AgentProfile,
    pub frontend: AgentProfile,
    pub reviewer: AgentProfile,
}

impl Default for AgentRoster {
    fn default() -> Self {
        Self::standard()
    }
}

impl AgentRoster {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            coordinator: coordinator(),
            backend: backend(),
            frontend: frontend(),
            reviewer: reviewer(),
        }
    }

    #[must_use]
    pub fn get(&self, kind: AgentKind) -> &AgentProfile {
        match kind {
            AgentKind::Coordinator => &self.coordinator,
            AgentKind::Backend => &self.backend,
            AgentKind::Frontend => &self.frontend,
            AgentKind::Reviewer => &self.reviewer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_roles() {
        let roster = AgentRoster::standard();
        assert_eq!(
            roster.coordinator.role,
            "AI Project Coordinator & Technical Architect"
        );
        assert_eq!(roster.backend.role, "Backend API & Database Specialist");
        assert_eq!(roster.frontend.role, "React UI/UX Specialist");
        assert_eq!(roster.reviewer.role, "Intelligent Code Completion Architect");
    }

    #[test]
    fn test_tool_bindings() {
        let roster = AgentRoster::standard();
        for kind in [AgentKind::Coordinator, AgentKind::Backend, AgentKind::Frontend] {
            let agent = roster.get(kind);
            assert!(agent.can_use(FILE_WRITER_TOOL));
            assert!(agent.can_use(CODE_LINTER_TOOL));
        }
        assert!(roster.reviewer.can_use(FILE_WRITER_TOOL));
        assert!(!roster.reviewer.can_use(CODE_LINTER_TOOL));
    }

    #[test]
    fn test_only_coordinator_delegates() {
        let roster = AgentRoster::standard();
        let delegating: Vec<_> = AgentKind::ALL
            .iter()
            .filter(|k| roster.get(**k).allow_delegation)
            .collect();
        assert_eq!(delegating, vec![&AgentKind::Coordinator]);
    }

    #[test]
    fn test_system_prompt_mentions_persona_and_tools() {
        let prompt = AgentRoster::standard().reviewer.system_prompt();
        assert!(prompt.starts_with("You are the Intelligent Code Completion Architect."));
        assert!(prompt.contains("file_writer"));
        assert!(!prompt.contains("code_linter"));
    }
}
