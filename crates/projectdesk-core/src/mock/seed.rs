//! Fixed seed records loaded on construction and on reset

use chrono::NaiveDate;

use crate::domain::{Priority, Project, ProjectStatus, Task, TaskStatus};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("seed dates are valid")
}

pub fn seed_projects() -> Vec<Project> {
    vec![
        Project {
            id: 1,
            name: "Sistema de E-commerce".to_string(),
            description: "Desenvolvimento de plataforma de vendas online".to_string(),
            start_date: date(2024, 1, 15),
            end_date: date(2024, 6, 30),
            status: ProjectStatus::InProgress,
            priority: Priority::High,
            team: vec!["João Silva".to_string(), "Maria Santos".to_string()],
        },
        Project {
            id: 2,
            name: "App Mobile Fitness".to_string(),
            description: "Aplicativo para acompanhamento de exercícios".to_string(),
            start_date: date(2024, 2, 1),
            end_date: date(2024, 8, 15),
            status: ProjectStatus::Planning,
            priority: Priority::Medium,
            team: vec!["Carlos Souza".to_string()],
        },
    ]
}

pub fn seed_tasks() -> Vec<Task> {
    vec![
        Task {
            id: 1,
            project_id: 1,
            title: "Criar layout responsivo".to_string(),
            description: Some("Implementar design mobile-first".to_string()),
            status: TaskStatus::Completed,
            assignee: "João Silva".to_string(),
            due_date: Some(date(2024, 3, 1)),
        },
        Task {
            id: 2,
            project_id: 1,
            title: "Integrar gateway de pagamento".to_string(),
            description: Some("Configurar Stripe API".to_string()),
            status: TaskStatus::InProgress,
            assignee: "Maria Santos".to_string(),
            due_date: Some(date(2024, 4, 15)),
        },
    ]
}
