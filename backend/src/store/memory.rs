// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    grading::{
        attempt::next_attempt_number,
        score::{TestProgress, aggregate, percentage},
    },
    models::{
        certification::{Certification, CertificationInput},
        favorite::Favorite,
        question::{Question, QuestionFilter, QuestionSummary},
        response::{HistoryParams, NewResponse, ResponseHistoryEntry, ResponseOutcome, UserResponse},
        section::{Section, Subsection, SubsectionCount},
        test::{Test, TestComposition, TestQuestion},
    },
};

use super::Store;

/// In-process store. All state sits behind one lock, which also makes
/// attempt-number assignment atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Keyed by slug.
    certifications: BTreeMap<String, Certification>,
    questions: BTreeMap<String, Question>,
    /// Section name -> (id, subsection name -> id).
    sections: BTreeMap<String, (i64, BTreeMap<String, i64>)>,
    tests: BTreeMap<i64, Test>,
    responses: Vec<UserResponse>,
    /// (user id, question id) -> bookmarked at.
    favorites: BTreeMap<(String, String), chrono::DateTime<Utc>>,
    next_certification_id: i64,
    next_section_id: i64,
    next_test_id: i64,
    next_response_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn section_id(&mut self, name: &str) -> i64 {
        if let Some((id, _)) = self.sections.get(name) {
            return *id;
        }
        self.next_section_id += 1;
        let id = self.next_section_id;
        self.sections.insert(name.to_string(), (id, BTreeMap::new()));
        id
    }

    fn subsection_id(&mut self, section: &str, name: &str) -> i64 {
        self.section_id(section);
        if let Some(id) = self.sections.get(section).and_then(|(_, subs)| subs.get(name)) {
            return *id;
        }
        self.next_section_id += 1;
        let id = self.next_section_id;
        if let Some((_, subs)) = self.sections.get_mut(section) {
            subs.insert(name.to_string(), id);
        }
        id
    }

    fn lookup_subsection(&self, question: &Question) -> Option<i64> {
        let (_, subs) = self.sections.get(question.section.as_deref()?)?;
        subs.get(question.subsection.as_deref()?).copied()
    }

    fn history_entry(&self, response: &UserResponse) -> ResponseHistoryEntry {
        let question = self.questions.get(&response.question_id);
        ResponseHistoryEntry {
            id: response.id,
            question_id: response.question_id.clone(),
            question: question.map(|q| q.question.clone()).unwrap_or_default(),
            section: question.and_then(|q| q.section.clone()),
            subsection: question.and_then(|q| q.subsection.clone()),
            test_id: response.test_id,
            selected_answers: response.selected_answers.clone(),
            is_correct: response.is_correct,
            attempt_number: response.attempt_number,
            created_at: response.created_at,
            is_favorite: self
                .favorites
                .contains_key(&(response.user_id.clone(), response.question_id.clone())),
        }
    }

    fn matches_history(&self, response: &UserResponse, params: &HistoryParams) -> bool {
        let question = self.questions.get(&response.question_id);
        let same = |wanted: &Option<String>, actual: Option<&String>| {
            wanted.as_ref().is_none_or(|w| actual == Some(w))
        };

        params.test_id.is_none_or(|t| response.test_id == Some(t))
            && params.question_id.as_ref().is_none_or(|q| &response.question_id == q)
            && params.is_correct.is_none_or(|c| response.is_correct == c)
            && same(&params.certification, question.and_then(|q| q.certification.as_ref()))
            && same(&params.section, question.and_then(|q| q.section.as_ref()))
            && same(&params.subsection, question.and_then(|q| q.subsection.as_ref()))
    }

    /// Builds the next response row without storing it.
    fn next_row(&mut self, response: &NewResponse) -> UserResponse {
        let attempt_number = next_attempt_number(
            self.responses
                .iter()
                .filter(|r| r.user_id == response.user_id && r.question_id == response.question_id)
                .map(|r| r.attempt_number),
        );

        self.next_response_id += 1;
        UserResponse {
            id: self.next_response_id,
            user_id: response.user_id.clone(),
            question_id: response.question_id.clone(),
            test_id: response.test_id,
            selected_answers: response.selected_answers.clone(),
            is_correct: response.is_correct,
            attempt_number,
            created_at: Utc::now(),
        }
    }

    fn recompute_score(&mut self, test_id: i64) -> Result<TestProgress, AppError> {
        let Inner { tests, responses, .. } = self;

        let test = tests
            .get_mut(&test_id)
            .ok_or(AppError::NotFound("Test not found".to_string()))?;

        let progress = aggregate(
            test.questions.len(),
            responses
                .iter()
                .filter(|r| r.test_id == Some(test_id))
                .map(|r| (r.question_id.as_str(), r.is_correct)),
        );

        test.score = progress.score;
        if progress.is_finished() && test.completed_at.is_none() {
            test.completed_at = Some(Utc::now());
        }
        Ok(progress)
    }

    /// Stores `response` and rescores `test_id` as one step. If the rescore
    /// fails the row is taken back out.
    fn record_scored(
        &mut self,
        response: &NewResponse,
        test_id: i64,
    ) -> Result<(UserResponse, TestProgress), AppError> {
        let row = self.next_row(response);
        self.responses.push(row.clone());

        match self.recompute_score(test_id) {
            Ok(progress) => Ok((row, progress)),
            Err(e) => {
                self.responses.pop();
                Err(e)
            }
        }
    }

    fn matches_composition(&self, question: &Question, composition: &TestComposition) -> bool {
        let in_list = |list: &[String], value: &Option<String>| {
            list.is_empty() || value.as_ref().is_some_and(|v| list.contains(v))
        };
        composition
            .certification
            .as_ref()
            .is_none_or(|c| question.certification.as_ref() == Some(c))
            && in_list(&composition.sections, &question.section)
            && in_list(&composition.subsections, &question.subsection)
            && (composition.tags.is_empty()
                || question.tags.iter().any(|t| composition.tags.contains(t)))
    }
}

fn pick_random(mut candidates: Vec<String>, count: usize) -> Vec<String> {
    candidates.shuffle(&mut rand::thread_rng());
    candidates.truncate(count);
    candidates
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_certification(
        &self,
        input: &CertificationInput,
    ) -> Result<Certification, AppError> {
        let mut inner = self.inner.lock().await;
        if inner
            .certifications
            .values()
            .any(|c| c.code == input.code && c.slug != input.slug)
        {
            return Err(AppError::Conflict(
                "Certification code already in use".to_string(),
            ));
        }

        let id = match inner.certifications.get(&input.slug) {
            Some(existing) => existing.id,
            None => {
                inner.next_certification_id += 1;
                inner.next_certification_id
            }
        };

        let certification = Certification {
            id,
            slug: input.slug.clone(),
            code: input.code.clone(),
            name: input.name.clone(),
            provider: input.provider.clone(),
        };
        inner
            .certifications
            .insert(certification.slug.clone(), certification.clone());
        Ok(certification)
    }

    async fn get_certification(&self, slug: &str) -> Result<Option<Certification>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.certifications.get(slug).cloned())
    }

    async fn list_certifications(&self) -> Result<Vec<Certification>, AppError> {
        let inner = self.inner.lock().await;
        let mut certifications: Vec<Certification> =
            inner.certifications.values().cloned().collect();
        certifications.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(certifications)
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        if let Some(slug) = &question.certification {
            if !inner.certifications.contains_key(slug) {
                return Err(AppError::NotFound("Certification not found".to_string()));
            }
        }
        match (&question.section, &question.subsection) {
            (Some(section), Some(subsection)) => {
                inner.subsection_id(section, subsection);
            }
            (Some(section), None) => {
                inner.section_id(section);
            }
            _ => {}
        }
        inner.questions.insert(question.id.clone(), question.clone());
        Ok(())
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.questions.get(id).cloned())
    }

    async fn get_questions(&self, ids: &[String]) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .questions
            .values()
            .filter(|q| ids.contains(&q.id))
            .cloned()
            .collect())
    }

    async fn next_question_id(&self, id: &str) -> Result<Option<String>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .questions
            .keys()
            .find(|k| k.as_str() > id)
            .cloned())
    }

    async fn list_questions(
        &self,
        user_id: &str,
        filter: &QuestionFilter,
    ) -> Result<Vec<QuestionSummary>, AppError> {
        let inner = self.inner.lock().await;
        let matches = |wanted: &Option<String>, actual: &Option<String>| {
            wanted.is_none() || wanted == actual
        };

        Ok(inner
            .questions
            .values()
            .filter(|q| matches(&filter.certification, &q.certification))
            .filter(|q| matches(&filter.section, &q.section))
            .filter(|q| matches(&filter.subsection, &q.subsection))
            .filter(|q| filter.tag.as_ref().is_none_or(|t| q.tags.contains(t)))
            .map(|q| {
                let is_favorite = inner
                    .favorites
                    .contains_key(&(user_id.to_string(), q.id.clone()));
                let mut attempts: Vec<&UserResponse> = inner
                    .responses
                    .iter()
                    .filter(|r| r.user_id == user_id && r.question_id == q.id)
                    .collect();
                attempts.sort_by_key(|r| r.attempt_number);
                let correct = attempts.iter().filter(|r| r.is_correct).count() as i64;

                QuestionSummary {
                    id: q.id.clone(),
                    question: q.question.clone(),
                    question_type: q.question_type,
                    section: q.section.clone(),
                    subsection: q.subsection.clone(),
                    tags: q.tags.clone(),
                    is_favorite,
                    attempts: attempts.len() as i64,
                    accuracy: percentage(correct, attempts.len() as i64).unwrap_or(0),
                    last_is_correct: attempts.last().map(|r| r.is_correct),
                }
            })
            .filter(|s| !filter.favorites_only || s.is_favorite)
            .collect())
    }

    async fn list_sections(&self) -> Result<Vec<Section>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sections
            .iter()
            .map(|(name, (id, subs))| Section {
                id: *id,
                name: name.clone(),
                subsections: subs
                    .iter()
                    .map(|(sub_name, sub_id)| Subsection {
                        id: *sub_id,
                        name: sub_name.clone(),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn question_counts_by_subsection(&self) -> Result<Vec<SubsectionCount>, AppError> {
        let inner = self.inner.lock().await;
        let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
        for question in inner.questions.values() {
            if let Some(id) = inner.lookup_subsection(question) {
                *counts.entry(id).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(subsection_id, question_count)| SubsectionCount {
                subsection_id,
                question_count,
            })
            .collect())
    }

    async fn create_random_test(
        &self,
        user_id: &str,
        composition: &TestComposition,
    ) -> Result<i64, AppError> {
        let mut inner = self.inner.lock().await;

        let candidates: Vec<String> = inner
            .questions
            .values()
            .filter(|q| inner.matches_composition(q, composition))
            .map(|q| q.id.clone())
            .collect();

        let picked = pick_random(candidates, composition.questions_count.max(0) as usize);
        if picked.is_empty() {
            return Err(AppError::BadRequest(
                "No questions match the requested filters".to_string(),
            ));
        }

        inner.next_test_id += 1;
        let id = inner.next_test_id;
        let questions = picked
            .into_iter()
            .zip(1..)
            .map(|(question_id, order)| TestQuestion { order, question_id })
            .collect();

        inner.tests.insert(
            id,
            Test {
                id,
                user_id: user_id.to_string(),
                certification: composition.certification.clone(),
                created_at: Utc::now(),
                completed_at: None,
                score: None,
                questions,
            },
        );
        Ok(id)
    }

    async fn list_tests(&self, user_id: &str) -> Result<Vec<Test>, AppError> {
        let inner = self.inner.lock().await;
        // Ids grow with creation time, so reverse id order is newest first.
        Ok(inner
            .tests
            .values()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_test(&self, user_id: &str, test_id: i64) -> Result<Option<Test>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tests
            .get(&test_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn delete_test(&self, user_id: &str, test_id: i64) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .tests
            .get(&test_id)
            .is_some_and(|t| t.user_id == user_id);
        if !owned {
            return Ok(false);
        }

        inner.tests.remove(&test_id);
        for response in inner.responses.iter_mut() {
            if response.test_id == Some(test_id) {
                response.test_id = None;
            }
        }
        Ok(true)
    }

    async fn record_response(&self, response: &NewResponse) -> Result<UserResponse, AppError> {
        let mut inner = self.inner.lock().await;
        let row = inner.next_row(response);
        inner.responses.push(row.clone());
        Ok(row)
    }

    async fn record_test_response(
        &self,
        response: &NewResponse,
    ) -> Result<(UserResponse, TestProgress), AppError> {
        let test_id = response
            .test_id
            .ok_or(AppError::BadRequest("A test id is required".to_string()))?;

        let mut inner = self.inner.lock().await;

        let test = inner
            .tests
            .get(&test_id)
            .filter(|t| t.user_id == response.user_id)
            .ok_or(AppError::NotFound("Test not found".to_string()))?;
        if !test.contains(&response.question_id) {
            return Err(AppError::BadRequest(
                "Question is not part of this test".to_string(),
            ));
        }

        inner.record_scored(response, test_id)
    }

    async fn update_test_score(&self, test_id: i64) -> Result<TestProgress, AppError> {
        let mut inner = self.inner.lock().await;
        inner.recompute_score(test_id)
    }

    async fn list_responses(
        &self,
        user_id: &str,
        params: &HistoryParams,
    ) -> Result<Vec<ResponseHistoryEntry>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .responses
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id && inner.matches_history(r, params))
            .map(|r| inner.history_entry(r))
            .collect())
    }

    async fn response_outcomes(&self, user_id: &str) -> Result<Vec<ResponseOutcome>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .responses
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| ResponseOutcome {
                question_id: r.question_id.clone(),
                subsection_id: inner
                    .questions
                    .get(&r.question_id)
                    .and_then(|q| inner.lookup_subsection(q)),
                is_correct: r.is_correct,
            })
            .collect())
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>, AppError> {
        let inner = self.inner.lock().await;
        let mut favorites: Vec<Favorite> = inner
            .favorites
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, question_id), created_at)| Favorite {
                question_id: question_id.clone(),
                created_at: *created_at,
            })
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn add_favorite(&self, user_id: &str, question_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner
            .favorites
            .entry((user_id.to_string(), question_id.to_string()))
            .or_insert_with(Utc::now);
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &str, question_id: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .favorites
            .remove(&(user_id.to_string(), question_id.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::question::QuestionType;

    fn question(
        id: &str,
        certification: Option<&str>,
        section: &str,
        subsection: &str,
        tags: &[&str],
    ) -> Question {
        Question {
            id: id.to_string(),
            question: format!("Question {}", id),
            question_type: QuestionType::SingleChoice,
            options: BTreeMap::from([
                ("A".to_string(), "Yes".to_string()),
                ("B".to_string(), "No".to_string()),
            ]),
            correct_answer: vec!["A".to_string()],
            explanation: None,
            certification: certification.map(str::to_string),
            section: Some(section.to_string()),
            subsection: Some(subsection.to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn new_response(user: &str, question_id: &str, test_id: Option<i64>, ok: bool) -> NewResponse {
        NewResponse {
            user_id: user.to_string(),
            question_id: question_id.to_string(),
            test_id,
            selected_answers: vec![if ok { "A" } else { "B" }.to_string()],
            is_correct: ok,
        }
    }

    /// Q001..Q003 belong to the "net-plus" certification, Q004..Q006 to none.
    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .upsert_certification(&CertificationInput {
                slug: "net-plus".to_string(),
                code: "N10-009".to_string(),
                name: "Network+".to_string(),
                provider: "CompTIA".to_string(),
            })
            .await
            .unwrap();

        for i in 1..=6 {
            let (certification, section, sub) = if i <= 3 {
                (Some("net-plus"), "Net", "Ports")
            } else {
                (None, "Sec", "Crypto")
            };
            let tags: &[&str] = if i % 2 == 0 { &["even"] } else { &[] };
            store
                .upsert_question(&question(&format!("Q00{}", i), certification, section, sub, tags))
                .await
                .unwrap();
        }
        store
    }

    fn composition(count: i64) -> TestComposition {
        TestComposition {
            questions_count: count,
            certification: None,
            sections: Vec::new(),
            subsections: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn attempt_numbers_are_per_user_and_question() {
        let store = seeded().await;
        let a1 = store.record_response(&new_response("u1", "Q001", None, false)).await.unwrap();
        let a2 = store.record_response(&new_response("u1", "Q001", None, true)).await.unwrap();
        let b1 = store.record_response(&new_response("u2", "Q001", None, true)).await.unwrap();
        let c1 = store.record_response(&new_response("u1", "Q002", None, true)).await.unwrap();

        assert_eq!((a1.attempt_number, a2.attempt_number), (1, 2));
        assert_eq!(b1.attempt_number, 1);
        assert_eq!(c1.attempt_number, 1);
    }

    #[tokio::test]
    async fn concurrent_submissions_never_share_an_attempt_number() {
        let store = Arc::new(seeded().await);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .record_response(&new_response("u1", "Q003", None, true))
                    .await
                    .unwrap()
                    .attempt_number
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort();
        assert_eq!(numbers, (1..=20).collect::<Vec<i32>>());
    }

    #[tokio::test]
    async fn composition_respects_filters_and_count() {
        let store = seeded().await;

        let mut only_even = composition(10);
        only_even.tags = vec!["even".to_string()];
        let id = store.create_random_test("u1", &only_even).await.unwrap();
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        assert_eq!(test.questions.len(), 3);
        let orders: Vec<i32> = test.questions.iter().map(|q| q.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);

        let mut crypto = composition(2);
        crypto.subsections = vec!["Crypto".to_string()];
        let id = store.create_random_test("u1", &crypto).await.unwrap();
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        assert_eq!(test.questions.len(), 2);
        assert!(test.questions.iter().all(|q| q.question_id.as_str() >= "Q004"));

        let mut none = composition(5);
        none.sections = vec!["Databases".to_string()];
        assert!(matches!(
            store.create_random_test("u1", &none).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn tests_are_private_to_their_owner() {
        let store = seeded().await;
        let id = store.create_random_test("u1", &composition(3)).await.unwrap();

        assert!(store.get_test("u2", id).await.unwrap().is_none());
        assert!(!store.delete_test("u2", id).await.unwrap());
        assert!(store.get_test("u1", id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn score_update_persists_and_marks_completion() {
        let store = seeded().await;
        let id = store.create_random_test("u1", &composition(2)).await.unwrap();
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        let first = test.questions[0].question_id.clone();
        let second = test.questions[1].question_id.clone();

        store.record_response(&new_response("u1", &first, Some(id), true)).await.unwrap();
        let progress = store.update_test_score(id).await.unwrap();
        assert_eq!(progress.score, Some(100));
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        assert_eq!(test.score, Some(100));
        assert!(test.completed_at.is_none());

        store.record_response(&new_response("u1", &second, Some(id), false)).await.unwrap();
        let progress = store.update_test_score(id).await.unwrap();
        assert_eq!(progress.score, Some(50));
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        assert!(test.completed_at.is_some());
    }

    #[tokio::test]
    async fn deleting_a_test_keeps_its_responses() {
        let store = seeded().await;
        let id = store.create_random_test("u1", &composition(1)).await.unwrap();
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        let question_id = test.questions[0].question_id.clone();
        store.record_response(&new_response("u1", &question_id, Some(id), true)).await.unwrap();

        assert!(store.delete_test("u1", id).await.unwrap());

        let history = store.list_responses("u1", &HistoryParams::default()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].test_id, None);
        assert!(matches!(
            store.update_test_score(id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_response_updates_score_in_the_same_step() {
        let store = seeded().await;
        let id = store.create_random_test("u1", &composition(2)).await.unwrap();
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        let first = test.questions[0].question_id.clone();

        let (row, progress) = store
            .record_test_response(&new_response("u1", &first, Some(id), true))
            .await
            .unwrap();
        assert_eq!(row.attempt_number, 1);
        assert_eq!(progress.score, Some(100));
        assert_eq!(store.get_test("u1", id).await.unwrap().unwrap().score, Some(100));
    }

    #[tokio::test]
    async fn failed_test_response_leaves_nothing_behind() {
        let store = seeded().await;
        let id = store.create_random_test("u1", &composition(1)).await.unwrap();
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        let question_id = test.questions[0].question_id.clone();
        let outsider = ["Q001", "Q002"]
            .into_iter()
            .find(|q| *q != question_id)
            .unwrap();

        // Someone else's test.
        assert!(matches!(
            store
                .record_test_response(&new_response("u2", &question_id, Some(id), true))
                .await,
            Err(AppError::NotFound(_))
        ));
        // A question the test does not contain.
        assert!(matches!(
            store
                .record_test_response(&new_response("u1", outsider, Some(id), true))
                .await,
            Err(AppError::BadRequest(_))
        ));
        // A deleted test.
        assert!(store.delete_test("u1", id).await.unwrap());
        assert!(matches!(
            store
                .record_test_response(&new_response("u1", &question_id, Some(id), true))
                .await,
            Err(AppError::NotFound(_))
        ));

        for user in ["u1", "u2"] {
            let history = store.list_responses(user, &HistoryParams::default()).await.unwrap();
            assert!(history.is_empty());
        }
        // No attempt number was consumed.
        let row = store
            .record_response(&new_response("u1", &question_id, None, true))
            .await
            .unwrap();
        assert_eq!(row.attempt_number, 1);
    }

    #[tokio::test]
    async fn failed_rescore_rolls_the_response_back() {
        let store = seeded().await;
        let mut inner = store.inner.lock().await;

        let result = inner.record_scored(&new_response("u1", "Q001", Some(999), true), 999);
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(inner.responses.is_empty());

        // The attempt number is still free.
        assert_eq!(inner.next_row(&new_response("u1", "Q001", None, true)).attempt_number, 1);
    }

    #[tokio::test]
    async fn certification_scopes_catalogue_and_composition() {
        let store = seeded().await;

        let filter = QuestionFilter {
            certification: Some("net-plus".to_string()),
            ..Default::default()
        };
        let ids: Vec<String> = store
            .list_questions("u1", &filter)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec!["Q001", "Q002", "Q003"]);

        let mut scoped = composition(10);
        scoped.certification = Some("net-plus".to_string());
        let id = store.create_random_test("u1", &scoped).await.unwrap();
        let test = store.get_test("u1", id).await.unwrap().unwrap();
        assert_eq!(test.certification.as_deref(), Some("net-plus"));
        assert_eq!(test.questions.len(), 3);
        assert!(test.questions.iter().all(|q| q.question_id.as_str() <= "Q003"));

        let orphan = question("Q900", Some("unknown-cert"), "Net", "Ports", &[]);
        assert!(matches!(
            store.upsert_question(&orphan).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn history_filters_and_flags_favorites() {
        let store = seeded().await;
        store.record_response(&new_response("u1", "Q001", None, true)).await.unwrap();
        store.record_response(&new_response("u1", "Q001", None, false)).await.unwrap();
        store.record_response(&new_response("u1", "Q004", None, true)).await.unwrap();
        store.add_favorite("u1", "Q004").await.unwrap();

        let all = store.list_responses("u1", &HistoryParams::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].question_id, "Q004");
        assert!(all[0].is_favorite);
        assert!(!all[1].is_favorite);

        let params = HistoryParams {
            certification: Some("net-plus".to_string()),
            is_correct: Some(false),
            ..Default::default()
        };
        let wrong = store.list_responses("u1", &params).await.unwrap();
        assert_eq!(wrong.len(), 1);
        assert_eq!(wrong[0].attempt_number, 2);

        let params = HistoryParams {
            section: Some("Sec".to_string()),
            ..Default::default()
        };
        assert_eq!(store.list_responses("u1", &params).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn catalogue_reports_accuracy_per_question() {
        let store = seeded().await;
        for ok in [true, false, true] {
            store.record_response(&new_response("u1", "Q002", None, ok)).await.unwrap();
        }

        let summaries = store.list_questions("u1", &QuestionFilter::default()).await.unwrap();
        let q2 = summaries.iter().find(|q| q.id == "Q002").unwrap();
        assert_eq!(q2.attempts, 3);
        assert_eq!(q2.accuracy, 67);
        assert_eq!(q2.last_is_correct, Some(true));

        let q1 = summaries.iter().find(|q| q.id == "Q001").unwrap();
        assert_eq!((q1.attempts, q1.accuracy), (0, 0));
    }

    #[tokio::test]
    async fn sections_and_counts_follow_ingested_questions() {
        let store = seeded().await;
        let sections = store.list_sections().await.unwrap();
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Net", "Sec"]);

        let counts = store.question_counts_by_subsection().await.unwrap();
        assert_eq!(counts.iter().map(|c| c.question_count).sum::<i64>(), 6);
    }
}
