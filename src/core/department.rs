//! Fixed department directory used for routing.

use serde::Serialize;

/// Department used when a classification names no known department.
pub const FALLBACK_DEPARTMENT_ID: &str = "general";

/// A routing target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Department {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub email: &'static str,
}

static DEPARTMENTS: [Department; 5] = [
    Department {
        id: "tech",
        name: "Техническая поддержка",
        description: "Проблемы с программным обеспечением, оборудованием, сетью",
        email: "tech@company.com",
    },
    Department {
        id: "sales",
        name: "Отдел продаж",
        description: "Вопросы о продуктах, ценах, заказах",
        email: "sales@company.com",
    },
    Department {
        id: "billing",
        name: "Бухгалтерия",
        description: "Вопросы по счетам, оплате, возвратам",
        email: "billing@company.com",
    },
    Department {
        id: "hr",
        name: "HR",
        description: "Кадровые вопросы, отпуска, документы",
        email: "hr@company.com",
    },
    Department {
        id: "general",
        name: "Общие вопросы",
        description: "Общие вопросы и обращения",
        email: "info@company.com",
    },
];

/// All departments in directory order.
pub fn all() -> &'static [Department] {
    &DEPARTMENTS
}

/// Look up a department by id.
pub fn by_id(id: &str) -> Option<&'static Department> {
    DEPARTMENTS.iter().find(|d| d.id == id)
}

/// The fallback department.
pub fn fallback() -> &'static Department {
    by_id(FALLBACK_DEPARTMENT_ID).unwrap_or(&DEPARTMENTS[DEPARTMENTS.len() - 1])
}

/// Resolve an id to a known department, falling back to `general`.
pub fn resolve(id: &str) -> &'static Department {
    by_id(id.trim()).unwrap_or_else(fallback)
}

/// One line per department for prompts: `id: name (description)`.
pub fn prompt_listing() -> String {
    DEPARTMENTS
        .iter()
        .map(|d| format!("{}: {} ({})", d.id, d.name, d.description))
        .collect::<Vec<_>>()
        .join("\n")
}
