//! Knowledge base entries.
//!
//! The knowledge base is a fixed list of question/answer records loaded once
//! at startup, either the built-in sample set or a TOML file:
//!
//! ```toml
//! [[entries]]
//! id = "faq-1"
//! question = "Как сбросить пароль?"
//! answer = "..."
//! category = "tech"
//! keywords = ["пароль", "сброс"]
//! language = "ru"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::language::Language;
use crate::error::{Result, TriageError};

/// Subject area of a knowledge entry. Identifiers match department ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tech,
    Sales,
    Billing,
    Hr,
    General,
}

impl Category {
    /// Identifier shared with the department directory.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tech => "tech",
            Category::Sales => "sales",
            Category::Billing => "billing",
            Category::Hr => "hr",
            Category::General => "general",
        }
    }
}

/// An immutable question/answer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: Category,
    /// Ordered match keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub language: Language,
}

impl KnowledgeEntry {
    /// Create a primary-language entry.
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        category: Category,
        keywords: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            language: Language::Primary,
        }
    }

    /// Set the entry language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    entries: Vec<KnowledgeEntry>,
}

/// Read-only collection of knowledge entries in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Build a knowledge base from entries, keeping their order.
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    /// The built-in sample knowledge base.
    pub fn sample() -> Self {
        Self::new(sample_entries())
    }

    /// Load entries from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| TriageError::storage(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse entries from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: KnowledgeFile =
            toml::from_str(content).map_err(|e| TriageError::config(e.to_string()))?;

        for (i, entry) in file.entries.iter().enumerate() {
            if entry.id.trim().is_empty() || entry.question.trim().is_empty() {
                return Err(TriageError::config(format!(
                    "knowledge entry #{} needs an id and a question",
                    i + 1
                )));
            }
            if file.entries[..i].iter().any(|e| e.id == entry.id) {
                return Err(TriageError::config(format!(
                    "duplicate knowledge entry id: {}",
                    entry.id
                )));
            }
        }

        Ok(Self::new(file.entries))
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &str) -> Option<&KnowledgeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::sample()
    }
}

fn sample_entries() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry::new(
            "faq-1",
            "Как сбросить пароль?",
            "Для сброса пароля перейдите на страницу входа и нажмите \"Забыли пароль?\". \
             Вам будет отправлено письмо с инструкциями на указанный email.",
            Category::Tech,
            &["пароль", "сброс", "забыл", "восстановление", "password", "reset"],
        ),
        KnowledgeEntry::new(
            "faq-2",
            "Как изменить email?",
            "Для изменения email перейдите в настройки профиля, раздел \"Контактная информация\", \
             и нажмите \"Изменить email\". Вам потребуется подтвердить новый email.",
            Category::Tech,
            &["email", "почта", "изменить", "настройки", "профиль"],
        ),
        KnowledgeEntry::new(
            "faq-3",
            "Какие способы оплаты доступны?",
            "Мы принимаем оплату банковскими картами (Visa, MasterCard, МИР), банковскими \
             переводами и электронными кошельками (ЮMoney, Qiwi).",
            Category::Billing,
            &["оплата", "платеж", "карта", "способ", "payment", "метод"],
        ),
        KnowledgeEntry::new(
            "faq-4",
            "Как вернуть товар?",
            "Для возврата товара свяжитесь с нашим отделом продаж в течение 14 дней с момента \
             покупки. Пришлите номер заказа и причину возврата.",
            Category::Sales,
            &["возврат", "товар", "вернуть", "refund", "return"],
        ),
        KnowledgeEntry::new(
            "faq-5",
            "Как оформить отпуск?",
            "Для оформления отпуска подайте заявление через корпоративный портал в разделе \"HR\" \
             или обратитесь к вашему руководителю. Заявление должно быть подано минимум за 2 недели.",
            Category::Hr,
            &["отпуск", "vacation", "leave", "заявление", "hr"],
        ),
        KnowledgeEntry::new(
            "faq-6",
            "Сайт не загружается",
            "Попробуйте очистить кэш браузера, отключить расширения или использовать другой \
             браузер. Если проблема сохраняется, проверьте интернет-соединение или свяжитесь с \
             технической поддержкой.",
            Category::Tech,
            &["сайт", "не работает", "не загружается", "ошибка", "site", "down"],
        ),
        KnowledgeEntry::new(
            "faq-7",
            "Где посмотреть статус заказа?",
            "Статус заказа можно посмотреть в личном кабинете в разделе \"Мои заказы\" или \
             отследить по номеру заказа на странице отслеживания.",
            Category::Sales,
            &["заказ", "статус", "отследить", "order", "status", "tracking"],
        ),
    ]
}
