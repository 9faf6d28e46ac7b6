//! Auto-resolution of incoming questions.
//!
//! Pipeline:
//! 1. Rank knowledge entries for the question.
//! 2. With a match, ask the capability whether the matched question and the
//!    live question are about the same thing. "No" hands off to an operator.
//! 3. Generate an answer restricted to the matched entry, or an unrestricted
//!    one when nothing matched.
//! 4. Score the answer with the confidence evaluator. Answers built from a
//!    knowledge entry must also pass a lexical re-check.
//!
//! Any capability failure before an answer exists is a handoff with
//! confidence 0. Nothing here can close a ticket except a positive
//! `AutoCloseGate` verdict.

use serde::Serialize;
use tracing::{debug, warn};

use crate::capability::{
    complete_json, is_affirmative, Completion, CompletionRequest, Generation,
};
use crate::core::confidence::{
    answer_mentions_question, evaluate, heuristic_evaluation, ConfidenceSignals, Evaluation,
    PARTIAL_CAP,
};
use crate::core::knowledge::{KnowledgeBase, KnowledgeEntry};
use crate::core::language::detect;
use crate::core::matcher;
use crate::error::Result;

/// Default number of knowledge candidates considered.
pub const DEFAULT_RESOLVER_LIMIT: usize = 3;

const RELEVANCE_SYSTEM_PROMPT: &str =
    "Ты проверяешь релевантность вопросов. Отвечай только \"ДА\" или \"НЕТ\".";
const GROUNDED_SYSTEM_PROMPT: &str =
    "Ты помощник службы поддержки. Отвечай вежливо и профессионально.";
const OPEN_SYSTEM_PROMPT: &str = "Ты опытный оператор службы поддержки. Отвечай вежливо, \
     профессионально и полезно. Всегда старайся помочь пользователю решить его проблему.";
const SIGNALS_SYSTEM_PROMPT: &str =
    "Ты аналитик, который оценивает качество ответов службы поддержки. Отвечай только валидным JSON.";

/// Whether an automatic answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Answered,
    Deferred,
}

/// Result of one auto-resolution attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionDecision {
    answer_text: String,
    confidence: f64,
    should_auto_close: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_entry_id: Option<String>,
    outcome: Outcome,
}

impl ResolutionDecision {
    /// Hand the question to an operator.
    pub fn deferred(source_entry_id: Option<String>) -> Self {
        Self {
            answer_text: String::new(),
            confidence: 0.0,
            should_auto_close: false,
            source_entry_id,
            outcome: Outcome::Deferred,
        }
    }

    /// An answer scored by the evaluator.
    pub fn answered(
        answer_text: impl Into<String>,
        evaluation: Evaluation,
        source_entry_id: Option<String>,
    ) -> Self {
        Self {
            answer_text: answer_text.into(),
            confidence: evaluation.confidence(),
            should_auto_close: evaluation.should_auto_close(),
            source_entry_id,
            outcome: Outcome::Answered,
        }
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn should_auto_close(&self) -> bool {
        self.should_auto_close
    }

    pub fn source_entry_id(&self) -> Option<&str> {
        self.source_entry_id.as_deref()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

/// Optional ticket context included in open generation prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionContext {
    pub category: Option<String>,
    pub ticket_type: Option<String>,
    pub department: Option<String>,
}

impl ResolutionContext {
    fn prompt_block(&self) -> String {
        let or = |v: &Option<String>, missing: &str| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(missing)
                .to_string()
        };
        format!(
            "\n\nКонтекст вопроса:\n- Категория: {}\n- Тип: {}\n- Отдел: {}",
            or(&self.category, "Не указана"),
            or(&self.ticket_type, "Не указан"),
            or(&self.department, "Не указан"),
        )
    }
}

/// Auto-resolution over a knowledge base and a capability.
pub struct Resolver<'a> {
    capability: &'a dyn Completion,
    kb: &'a KnowledgeBase,
    limit: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(capability: &'a dyn Completion, kb: &'a KnowledgeBase) -> Self {
        Self {
            capability,
            kb,
            limit: DEFAULT_RESOLVER_LIMIT,
        }
    }

    /// Override the candidate limit (minimum 1).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Decide how to answer a question. Total and stateless.
    pub fn resolve(
        &self,
        question: &str,
        context: Option<&ResolutionContext>,
    ) -> ResolutionDecision {
        if question.trim().is_empty() {
            return ResolutionDecision::deferred(None);
        }

        let candidates = matcher::rank(self.kb, question, self.limit);
        let decision = match candidates.first() {
            Some(best) => {
                let source = Some(best.entry.id.clone());
                self.resolve_from_entry(question, &best.entry)
                    .unwrap_or_else(|e| {
                        warn!("knowledge answer failed: {} (deferring)", e);
                        ResolutionDecision::deferred(source)
                    })
            }
            None => self.resolve_open(question, context).unwrap_or_else(|e| {
                warn!("answer generation failed: {} (deferring)", e);
                ResolutionDecision::deferred(None)
            }),
        };

        debug!(
            outcome = ?decision.outcome(),
            confidence = decision.confidence(),
            auto_close = decision.should_auto_close(),
            source = ?decision.source_entry_id(),
            "resolution decided"
        );

        decision
    }

    /// Generate an answer without a knowledge entry. Total.
    ///
    /// Used as a second attempt when a matched entry was rejected; the
    /// caller decides whether to keep the result.
    pub fn resolve_open_with(
        &self,
        question: &str,
        context: Option<&ResolutionContext>,
    ) -> ResolutionDecision {
        if question.trim().is_empty() {
            return ResolutionDecision::deferred(None);
        }

        let decision = self.resolve_open(question, context).unwrap_or_else(|e| {
            warn!("answer generation failed: {} (deferring)", e);
            ResolutionDecision::deferred(None)
        });
        debug!(
            outcome = ?decision.outcome(),
            confidence = decision.confidence(),
            auto_close = decision.should_auto_close(),
            "open resolution decided"
        );
        decision
    }

    fn resolve_from_entry(
        &self,
        question: &str,
        entry: &KnowledgeEntry,
    ) -> Result<ResolutionDecision> {
        let source = Some(entry.id.clone());

        if !self.judge_relevance(question, entry)? {
            debug!(entry_id = %entry.id, "matched entry judged unrelated");
            return Ok(ResolutionDecision::deferred(source));
        }

        let answer = match self.generate_grounded(question, entry)? {
            Generation::Answered(text) => text,
            Generation::Deferred => return Ok(ResolutionDecision::deferred(source)),
        };

        let mut evaluation = self.score_answer(question, &answer);
        if !answer_mentions_question(question, &answer) {
            debug!(entry_id = %entry.id, "answer failed lexical re-check");
            evaluation = evaluation.demote(PARTIAL_CAP);
        }

        Ok(ResolutionDecision::answered(answer, evaluation, source))
    }

    fn resolve_open(
        &self,
        question: &str,
        context: Option<&ResolutionContext>,
    ) -> Result<ResolutionDecision> {
        let answer = match self.generate_open(question, context)? {
            Generation::Answered(text) => text,
            Generation::Deferred => return Ok(ResolutionDecision::deferred(None)),
        };

        let evaluation = self.score_answer(question, &answer);
        Ok(ResolutionDecision::answered(answer, evaluation, None))
    }

    fn judge_relevance(&self, question: &str, entry: &KnowledgeEntry) -> Result<bool> {
        let prompt = format!(
            "Вопрос пользователя: \"{}\"\nВопрос из базы знаний: \"{}\"\n\n\
             Оцени, насколько эти вопросы связаны между собой. Ответь ТОЛЬКО \"ДА\" если вопросы \
             связаны и найденный ответ можно использовать, или \"НЕТ\" если вопросы не связаны.\n\n\
             Ответ (только \"ДА\" или \"НЕТ\"):",
            question, entry.question
        );
        let request = CompletionRequest::new(RELEVANCE_SYSTEM_PROMPT, prompt)
            .temperature(0.1)
            .max_tokens(10);

        let reply = self.capability.complete(&request)?;
        Ok(is_affirmative(&reply))
    }

    fn generate_grounded(&self, question: &str, entry: &KnowledgeEntry) -> Result<Generation> {
        let language = detect(question);
        let prompt = format!(
            "Пользователь задал вопрос: \"{}\"\n\n\
             Найденный ответ из базы знаний: \"{}\"\n\n\
             КРИТИЧЕСКИ ВАЖНО:\n\
             - Используй ТОЛЬКО информацию из найденного ответа\n\
             - Ответ должен ТОЧНО отвечать на заданный вопрос\n\
             - Если найденный ответ НЕ ОТВЕЧАЕТ на заданный вопрос - верни ТОЛЬКО \"OPERATOR_REQUIRED\"\n\
             - Если вопрос не про техническую поддержку, IT, продажи, бухгалтерию или HR - верни \"OPERATOR_REQUIRED\"\n\
             - Ответ должен быть на {} языке (на том же языке, на котором задан вопрос)\n\
             - Ответ должен быть вежливым, профессиональным и ПОЛНОСТЬЮ отвечать на вопрос\n\n\
             Ответ (только текст ответа, без дополнительных комментариев. Если не можешь точно \
             ответить - верни только \"OPERATOR_REQUIRED\"):",
            question,
            entry.answer,
            language.prompt_name()
        );
        let request = CompletionRequest::new(GROUNDED_SYSTEM_PROMPT, prompt)
            .temperature(0.7)
            .max_tokens(300);

        Ok(Generation::from_reply(&self.capability.complete(&request)?))
    }

    fn generate_open(
        &self,
        question: &str,
        context: Option<&ResolutionContext>,
    ) -> Result<Generation> {
        let language = detect(question);
        let context_block = context.map(|c| c.prompt_block()).unwrap_or_default();
        let prompt = format!(
            "Ты помощник службы поддержки. Пользователь задал вопрос: \"{}\"{}\n\n\
             КРИТИЧЕСКИ ВАЖНО:\n\
             - Отвечай ТОЛЬКО на вопросы про техническую поддержку, IT, продажи, бухгалтерию, HR или корпоративные вопросы\n\
             - Если вопрос философский, общий или не про работу/технику - верни ТОЛЬКО \"OPERATOR_REQUIRED\"\n\
             - Отвечай ТОЛЬКО если можешь дать ТОЧНЫЙ и ПОЛНЫЙ ответ на конкретный вопрос\n\
             - Если вопрос неясный, требует дополнительной информации или ты не уверен - верни \"OPERATOR_REQUIRED\"\n\
             - Ответ должен быть на {} языке (на том же языке, на котором задан вопрос)\n\
             - Ответ должен быть вежливым, профессиональным и ПОЛНОСТЬЮ отвечать на заданный вопрос\n\n\
             Сгенерируй ответ (только текст ответа, без дополнительных комментариев. Если не можешь \
             точно ответить или вопрос не по теме - верни только \"OPERATOR_REQUIRED\"):",
            question,
            context_block,
            language.prompt_name()
        );
        let request = CompletionRequest::new(OPEN_SYSTEM_PROMPT, prompt)
            .temperature(0.7)
            .max_tokens(500);

        Ok(Generation::from_reply(&self.capability.complete(&request)?))
    }

    fn extract_signals(&self, question: &str, answer: &str) -> Result<ConfidenceSignals> {
        let prompt = format!(
            "Проанализируй вопрос и ответ на релевантность и точность:\n\n\
             Вопрос: \"{}\"\nОтвет: \"{}\"\n\n\
             КРИТИЧЕСКИ ВАЖНО - оцени строго:\n\
             1. Отвечает ли ответ НАПРЯМУЮ на заданный вопрос? (да/нет)\n\
             2. Является ли ответ ТОЧНЫМ и ПОЛНЫМ? (да/нет)\n\
             3. Является ли вопрос простым/стандартным, на который можно дать точный ответ? (да/нет)\n\
             4. Нужна ли дополнительная информация от пользователя для ответа? (да/нет)\n\
             5. Может ли этот вопрос быть закрыт автоматически БЕЗ участия оператора? (да/нет)\n\
             6. Релевантен ли ответ теме вопроса? (да/нет)\n\n\
             Ответь в формате JSON:\n\
             {{\n  \"isRelevant\": true/false,\n  \"isAccurate\": true/false,\n  \"isSimple\": true/false,\n  \
             \"isComplete\": true/false,\n  \"needsMoreInfo\": true/false,\n  \"canAutoClose\": true/false,\n  \
             \"confidence\": 0.0-1.0\n}}\n\n\
             ВАЖНО: Если ответ не релевантен, неточен или неполон - установи canAutoClose в false и confidence < 0.7",
            question, answer
        );
        let request = CompletionRequest::new(SIGNALS_SYSTEM_PROMPT, prompt)
            .temperature(0.3)
            .max_tokens(200)
            .structured();

        ConfidenceSignals::from_json(complete_json(self.capability, &request)?)
    }

    /// Evaluate an answer, falling back to the heuristic when signals
    /// cannot be obtained.
    fn score_answer(&self, question: &str, answer: &str) -> Evaluation {
        match self.extract_signals(question, answer) {
            Ok(signals) => evaluate(question, answer, &signals),
            Err(e) => {
                warn!("confidence signals unavailable: {} (using heuristic)", e);
                heuristic_evaluation(question, answer)
            }
        }
    }
}

/// Resolve a question with the default candidate limit.
pub fn resolve(
    capability: &dyn Completion,
    kb: &KnowledgeBase,
    question: &str,
    context: Option<&ResolutionContext>,
) -> ResolutionDecision {
    Resolver::new(capability, kb).resolve(question, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ScriptedCompletion, ScriptedReply, Unconfigured};
    use crate::core::confidence::AUTO_CLOSE_THRESHOLD;

    const PASSWORD_QUESTION: &str = "Как сбросить пароль?";
    const PASSWORD_ANSWER: &str = "Чтобы сбросить пароль, откройте страницу входа и нажмите \
         \"Забыли пароль?\". Инструкции придут на ваш email.";

    fn all_clear(confidence: f64) -> String {
        format!(
            r#"{{"isRelevant": true, "isAccurate": true, "isSimple": true, "isComplete": true,
                "needsMoreInfo": false, "canAutoClose": true, "confidence": {}}}"#,
            confidence
        )
    }

    #[test]
    fn test_full_pass_auto_closes() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text("ДА"),
            ScriptedReply::text(PASSWORD_ANSWER),
            ScriptedReply::text(all_clear(0.9)),
        ]);
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Answered);
        assert!(decision.should_auto_close());
        assert!(decision.confidence() > AUTO_CLOSE_THRESHOLD);
        assert_eq!(decision.source_entry_id(), Some("faq-1"));
        assert_eq!(decision.answer_text(), PASSWORD_ANSWER);
        assert_eq!(cap.call_count(), 3);

        let requests = cap.requests();
        assert_eq!(requests[0].max_tokens, Some(10));
        assert!(requests[0].user_prompt.contains("Как сбросить пароль?"));
        assert!(requests[1].user_prompt.contains("Забыли пароль?"));
        assert!(requests[1].user_prompt.contains("русский"));
        assert!(requests[2].structured_output);
    }

    #[test]
    fn test_relevance_no_defers_with_zero_confidence() {
        let cap = ScriptedCompletion::new(vec![ScriptedReply::text("НЕТ")]);
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert_eq!(decision.confidence(), 0.0);
        assert!(!decision.should_auto_close());
        assert_eq!(decision.source_entry_id(), Some("faq-1"));
        assert_eq!(cap.call_count(), 1);
    }

    #[test]
    fn test_explanatory_no_defers() {
        let cap = ScriptedCompletion::new(vec![ScriptedReply::text(
            "НЕТ, найденный ответ не подходит к данному вопросу",
        )]);
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert_eq!(cap.call_count(), 1);
    }

    #[test]
    fn test_capability_error_defers() {
        let cap = ScriptedCompletion::failing("HTTP 503");
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert_eq!(decision.confidence(), 0.0);
        assert!(!decision.should_auto_close());
    }

    #[test]
    fn test_unconfigured_never_closes() {
        let kb = KnowledgeBase::sample();
        for question in [PASSWORD_QUESTION, "Расскажите про квантовую механику"] {
            let decision = resolve(&Unconfigured, &kb, question, None);
            assert_eq!(decision.outcome(), Outcome::Deferred);
            assert!(!decision.should_auto_close());
        }
    }

    #[test]
    fn test_grounded_operator_required_defers() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text("ДА"),
            ScriptedReply::text("OPERATOR_REQUIRED"),
        ]);
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert_eq!(decision.source_entry_id(), Some("faq-1"));
        assert_eq!(cap.call_count(), 2);
    }

    #[test]
    fn test_lexical_recheck_demotes() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text("ДА"),
            ScriptedReply::text("Спасибо за обращение, мы скоро с вами свяжемся."),
            ScriptedReply::text(all_clear(0.95)),
        ]);
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Answered);
        assert!(!decision.should_auto_close());
        assert!((decision.confidence() - PARTIAL_CAP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_signal_failure_uses_heuristic() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text("ДА"),
            ScriptedReply::text(PASSWORD_ANSWER),
            ScriptedReply::text("not json"),
        ]);
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Answered);
        assert!(!decision.should_auto_close());
        assert!(decision.confidence() <= 0.65);
    }

    #[test]
    fn test_open_generation_when_no_match() {
        let answer = "Квантовая механика описывает поведение частиц на малых масштабах.";
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text(answer),
            ScriptedReply::text(all_clear(0.9)),
        ]);
        let kb = KnowledgeBase::sample();
        let context = ResolutionContext {
            category: Some("Общий вопрос".to_string()),
            ..Default::default()
        };

        let decision = resolve(&cap, &kb, "Расскажите про квантовую механику", Some(&context));
        assert_eq!(decision.outcome(), Outcome::Answered);
        assert!(decision.should_auto_close());
        assert_eq!(decision.source_entry_id(), None);

        let prompt = &cap.requests()[0].user_prompt;
        assert!(prompt.contains("Категория: Общий вопрос"));
        assert!(prompt.contains("Тип: Не указан"));
    }

    #[test]
    fn test_open_generation_operator_required() {
        let cap = ScriptedCompletion::always("OPERATOR_REQUIRED");
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, "Расскажите про квантовую механику", None);
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert_eq!(cap.call_count(), 1);
    }

    #[test]
    fn test_resolve_open_with_skips_knowledge_base() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text(PASSWORD_ANSWER),
            ScriptedReply::text(all_clear(0.9)),
        ]);
        let kb = KnowledgeBase::sample();
        let context = ResolutionContext {
            department: Some("Техническая поддержка".to_string()),
            ..Default::default()
        };

        let decision = Resolver::new(&cap, &kb).resolve_open_with(PASSWORD_QUESTION, Some(&context));
        assert_eq!(decision.outcome(), Outcome::Answered);
        assert!(decision.should_auto_close());
        assert_eq!(decision.source_entry_id(), None);
        assert_eq!(cap.call_count(), 2);
        assert!(cap.requests()[0].user_prompt.contains("Отдел: Техническая поддержка"));
    }

    #[test]
    fn test_resolve_open_with_failure_defers() {
        let kb = KnowledgeBase::sample();
        let decision = Resolver::new(&Unconfigured, &kb).resolve_open_with(PASSWORD_QUESTION, None);
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert_eq!(decision.confidence(), 0.0);
        assert!(!decision.should_auto_close());
    }

    #[test]
    fn test_empty_question_defers_without_calls() {
        let cap = ScriptedCompletion::always("ДА");
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, "   ", None);
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert_eq!(cap.call_count(), 0);
    }

    #[test]
    fn test_needs_more_info_never_closes() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text("ДА"),
            ScriptedReply::text(PASSWORD_ANSWER),
            ScriptedReply::text(
                r#"{"isRelevant": true, "isAccurate": true, "isComplete": true,
                    "needsMoreInfo": true, "canAutoClose": true, "confidence": 0.99}"#,
            ),
        ]);
        let kb = KnowledgeBase::sample();

        let decision = resolve(&cap, &kb, PASSWORD_QUESTION, None);
        assert!(!decision.should_auto_close());
        assert!(decision.confidence() <= PARTIAL_CAP);
    }

    #[test]
    fn test_decision_serializes_outcome() {
        let json = serde_json::to_value(ResolutionDecision::deferred(None)).unwrap();
        assert_eq!(json["outcome"], "deferred");
        assert_eq!(json["confidence"], 0.0);
        assert!(json.get("source_entry_id").is_none());
    }
}
