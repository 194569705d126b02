//! Notification dispatch - the fire-and-forget delivery pipeline.
//!
//! Confirmed leads are pushed onto a bounded queue consumed by a small
//! worker pool, so delivery never delays the visitor-facing reply and
//! shutdown can drain what is still pending. The dispatcher itself keeps
//! no deduplication memory: invoked twice, it sends twice. Idempotency is
//! the orchestrator's conditional-confirm guard.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::NotifyConfig;
use crate::domain::foundation::{CompanyId, LeadId};
use crate::domain::lead::{HistoryEntry, Speaker, Temperature};
use crate::ports::{BotSender, CompanyDirectory, CompanyProfile, MailSender};

/// One confirmed-lead report awaiting delivery.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub company_id: CompanyId,
    pub lead_id: LeadId,
    pub contact_name: String,
    pub phone: String,
    pub temperature: Temperature,
    /// Classifier narrative shown to the sales staff.
    pub summary: String,
    /// Recent conversation lines included in the report.
    pub history: Vec<HistoryEntry>,
}

/// Resolved delivery credentials for one tenant.
///
/// Pure per-field fallback: the tenant's value when present and
/// non-empty, the process-wide default otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryCredentials {
    pub bot_token: Option<String>,
    pub manager_chat_id: Option<String>,
    pub notify_email: Option<String>,
}

impl DeliveryCredentials {
    /// Resolves credentials for a tenant against the injected defaults.
    pub fn resolve(defaults: &NotifyConfig, company: Option<&CompanyProfile>) -> Self {
        fn pick(tenant: Option<&String>, default: Option<&String>) -> Option<String> {
            tenant
                .filter(|v| !v.is_empty())
                .or(default.filter(|v| !v.is_empty()))
                .cloned()
        }

        Self {
            bot_token: pick(
                company.and_then(|c| c.bot_token.as_ref()),
                defaults.bot_token.as_ref(),
            ),
            manager_chat_id: pick(
                company.and_then(|c| c.manager_chat_id.as_ref()),
                defaults.manager_chat_id.as_ref(),
            ),
            notify_email: pick(
                company.and_then(|c| c.notify_email.as_ref()),
                defaults.notify_email.as_ref(),
            ),
        }
    }
}

/// Producer handle onto the bounded notification queue.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    /// Enqueues a job without waiting.
    ///
    /// Returns false when the queue is full or the workers are gone; the
    /// notification is lost and logged, never retried. The visitor-facing
    /// turn has already committed by the time this is called.
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        let lead_id = job.lead_id;
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                error!(%lead_id, "notification queue full; dropping report");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(%lead_id, "notification workers stopped; dropping report");
                false
            }
        }
    }
}

/// Join handles of the running worker pool.
///
/// Dropping every [`NotificationQueue`] clone closes the channel; the
/// workers then finish whatever is queued and exit, so awaiting
/// [`NotificationWorkers::drain`] gives a clean shutdown.
pub struct NotificationWorkers {
    handles: Vec<JoinHandle<()>>,
}

impl NotificationWorkers {
    /// Waits for every worker to drain and stop.
    pub async fn drain(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!(error = %err, "notification worker panicked");
            }
        }
    }
}

/// Spawns the queue plus `workers` consumer tasks.
pub fn spawn_notification_workers(
    dispatcher: Arc<NotificationDispatcher>,
    capacity: usize,
    workers: usize,
) -> (NotificationQueue, NotificationWorkers) {
    let (tx, rx) = mpsc::channel(capacity);
    let rx = Arc::new(Mutex::new(rx));

    let handles = (0..workers.max(1))
        .map(|worker| {
            let rx = Arc::clone(&rx);
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                loop {
                    let job = { rx.lock().await.recv().await };
                    match job {
                        Some(job) => dispatcher.dispatch(&job).await,
                        None => break,
                    }
                }
                info!(worker, "notification worker drained");
            })
        })
        .collect();

    (NotificationQueue { tx }, NotificationWorkers { handles })
}

/// Delivers one report across both channels.
pub struct NotificationDispatcher {
    directory: Arc<dyn CompanyDirectory>,
    bot: Arc<dyn BotSender>,
    mail: Arc<dyn MailSender>,
    defaults: NotifyConfig,
}

impl NotificationDispatcher {
    /// Creates a dispatcher with injected defaults (no globals).
    pub fn new(
        directory: Arc<dyn CompanyDirectory>,
        bot: Arc<dyn BotSender>,
        mail: Arc<dyn MailSender>,
        defaults: NotifyConfig,
    ) -> Self {
        Self {
            directory,
            bot,
            mail,
            defaults,
        }
    }

    /// Sends the report to the manager chat and the notification email.
    ///
    /// Each channel fails independently: a failure is logged with enough
    /// context to correlate the missed notification and never aborts the
    /// sibling channel.
    pub async fn dispatch(&self, job: &NotificationJob) {
        let company_id = job.company_id;
        let lead_id = job.lead_id;

        let profile = match self.directory.find(company_id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(%company_id, %lead_id, error = %err,
                    "tenant lookup failed; using default credentials");
                None
            }
        };
        let creds = DeliveryCredentials::resolve(&self.defaults, profile.as_ref());
        let company_name = profile
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| format!("company {company_id}"));

        let (subject, text_body, html_body) = render_report(&company_name, job, self.defaults.report_history);

        // The channels run concurrently and fail independently.
        let bot_send = async {
            match (&creds.bot_token, &creds.manager_chat_id) {
                (Some(token), Some(chat_id)) => {
                    if let Err(err) = self.bot.send_message(token, chat_id, &html_body).await {
                        error!(%company_id, %lead_id, channel = "bot", error = %err,
                            "notification delivery failed");
                    }
                }
                _ => warn!(%company_id, %lead_id, channel = "bot",
                    "no bot credentials resolved; skipping"),
            }
        };
        let mail_send = async {
            match &creds.notify_email {
                Some(to) => {
                    if let Err(err) = self.mail.send(to, &subject, &text_body, &html_body).await {
                        error!(%company_id, %lead_id, channel = "email", error = %err,
                            "notification delivery failed");
                    }
                }
                None => warn!(%company_id, %lead_id, channel = "email",
                    "no notification email resolved; skipping"),
            }
        };
        tokio::join!(bot_send, mail_send);

        info!(%company_id, %lead_id, "notification dispatch finished");
    }
}

/// Escapes the characters Telegram's HTML parse mode reserves.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders the report as (subject, plain text, HTML).
fn render_report(
    company_name: &str,
    job: &NotificationJob,
    history_lines: usize,
) -> (String, String, String) {
    let subject = format!("New confirmed lead: {}", job.contact_name);

    let window: Vec<&HistoryEntry> = job
        .history
        .iter()
        .rev()
        .take(history_lines)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let mut text = String::new();
    text.push_str(&format!("New confirmed lead for {company_name}\n\n"));
    text.push_str(&format!("Name: {}\n", job.contact_name));
    text.push_str(&format!("Phone: {}\n", job.phone));
    text.push_str(&format!("Temperature: {}\n\n", job.temperature.label()));
    text.push_str(&format!("Summary:\n{}\n\n", job.summary));
    text.push_str("Recent conversation:\n");
    for entry in &window {
        let who = match entry.speaker {
            Speaker::Visitor => "Visitor",
            Speaker::Engine => "Bot",
        };
        text.push_str(&format!("{who}: {}\n", entry.text));
    }

    let mut html = String::new();
    html.push_str(&format!(
        "<b>New confirmed lead for {}</b>\n\n",
        escape_html(company_name)
    ));
    html.push_str(&format!("<b>Name:</b> {}\n", escape_html(&job.contact_name)));
    html.push_str(&format!("<b>Phone:</b> {}\n", escape_html(&job.phone)));
    html.push_str(&format!(
        "<b>Temperature:</b> {}\n\n",
        job.temperature.label()
    ));
    html.push_str(&format!(
        "<b>Summary:</b>\n{}\n\n",
        escape_html(&job.summary)
    ));
    html.push_str("<b>Recent conversation:</b>\n");
    for entry in &window {
        let who = match entry.speaker {
            Speaker::Visitor => "Visitor",
            Speaker::Engine => "Bot",
        };
        html.push_str(&format!("{who}: {}\n", escape_html(&entry.text)));
    }

    (subject, text, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    use crate::ports::{DirectoryError, SendError};

    fn job() -> NotificationJob {
        NotificationJob {
            company_id: CompanyId::new(7),
            lead_id: LeadId::new(),
            contact_name: "Meiramgul".to_string(),
            phone: "+77012345678".to_string(),
            temperature: Temperature::Hot,
            summary: "Very engaged.".to_string(),
            history: vec![
                HistoryEntry::visitor("хочу заказать"),
                HistoryEntry::engine("как вас зовут?"),
            ],
        }
    }

    fn defaults() -> NotifyConfig {
        NotifyConfig {
            bot_token: Some("default-token".to_string()),
            manager_chat_id: Some("-100".to_string()),
            notify_email: Some("sales@default.example".to_string()),
            smtp_host: "smtp.example.com".to_string(),
            smtp_username: "bot@example.com".to_string(),
            smtp_password: "secret".to_string(),
            from_email: "bot@example.com".to_string(),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct RecordingBot {
        sent: StdMutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl BotSender for RecordingBot {
        async fn send_message(
            &self,
            token: &str,
            chat_id: &str,
            html_text: &str,
        ) -> Result<(), SendError> {
            if self.fail {
                return Err(SendError::Network("bot down".to_string()));
            }
            self.sent.lock().unwrap().push((
                token.to_string(),
                chat_id.to_string(),
                html_text.to_string(),
            ));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingMail {
        sent: StdMutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl MailSender for RecordingMail {
        async fn send(
            &self,
            to: &str,
            subject: &str,
            text_body: &str,
            _html_body: &str,
        ) -> Result<(), SendError> {
            self.sent.lock().unwrap().push((
                to.to_string(),
                subject.to_string(),
                text_body.to_string(),
            ));
            Ok(())
        }
    }

    struct StaticDirectory(Option<CompanyProfile>);

    #[async_trait]
    impl CompanyDirectory for StaticDirectory {
        async fn find(&self, _id: CompanyId) -> Result<Option<CompanyProfile>, DirectoryError> {
            Ok(self.0.clone())
        }
    }

    mod credentials {
        use super::*;

        #[test]
        fn tenant_fields_take_precedence() {
            let profile = CompanyProfile {
                id: 7,
                bot_token: Some("tenant-token".to_string()),
                ..Default::default()
            };
            let creds = DeliveryCredentials::resolve(&defaults(), Some(&profile));

            assert_eq!(creds.bot_token.as_deref(), Some("tenant-token"));
            // Unset tenant fields fall back.
            assert_eq!(creds.manager_chat_id.as_deref(), Some("-100"));
            assert_eq!(creds.notify_email.as_deref(), Some("sales@default.example"));
        }

        #[test]
        fn empty_tenant_fields_fall_back() {
            let profile = CompanyProfile {
                id: 7,
                bot_token: Some(String::new()),
                ..Default::default()
            };
            let creds = DeliveryCredentials::resolve(&defaults(), Some(&profile));
            assert_eq!(creds.bot_token.as_deref(), Some("default-token"));
        }

        #[test]
        fn unknown_company_uses_defaults() {
            let creds = DeliveryCredentials::resolve(&defaults(), None);
            assert_eq!(creds.bot_token.as_deref(), Some("default-token"));
            assert_eq!(creds.manager_chat_id.as_deref(), Some("-100"));
        }
    }

    mod delivery {
        use super::*;

        #[tokio::test]
        async fn sends_to_both_channels() {
            let bot = Arc::new(RecordingBot::default());
            let mail = Arc::new(RecordingMail::default());
            let dispatcher = NotificationDispatcher::new(
                Arc::new(StaticDirectory(None)),
                bot.clone(),
                mail.clone(),
                defaults(),
            );

            dispatcher.dispatch(&job()).await;

            let bot_sent = bot.sent.lock().unwrap();
            assert_eq!(bot_sent.len(), 1);
            assert_eq!(bot_sent[0].0, "default-token");
            assert!(bot_sent[0].2.contains("Meiramgul"));

            let mail_sent = mail.sent.lock().unwrap();
            assert_eq!(mail_sent.len(), 1);
            assert_eq!(mail_sent[0].0, "sales@default.example");
            assert!(mail_sent[0].2.contains("+77012345678"));
        }

        #[tokio::test]
        async fn bot_failure_does_not_abort_email() {
            let bot = Arc::new(RecordingBot {
                fail: true,
                ..Default::default()
            });
            let mail = Arc::new(RecordingMail::default());
            let dispatcher = NotificationDispatcher::new(
                Arc::new(StaticDirectory(None)),
                bot,
                mail.clone(),
                defaults(),
            );

            dispatcher.dispatch(&job()).await;

            assert_eq!(mail.sent.lock().unwrap().len(), 1);
        }

        #[tokio::test]
        async fn worker_pool_drains_on_queue_drop() {
            let bot = Arc::new(RecordingBot::default());
            let mail = Arc::new(RecordingMail::default());
            let dispatcher = Arc::new(NotificationDispatcher::new(
                Arc::new(StaticDirectory(None)),
                bot.clone(),
                mail.clone(),
                defaults(),
            ));

            let (queue, workers) = spawn_notification_workers(dispatcher, 8, 2);
            assert!(queue.enqueue(job()));
            assert!(queue.enqueue(job()));
            drop(queue);
            workers.drain().await;

            assert_eq!(bot.sent.lock().unwrap().len(), 2);
            assert_eq!(mail.sent.lock().unwrap().len(), 2);
        }

        #[tokio::test]
        async fn full_queue_drops_job() {
            let dispatcher = Arc::new(NotificationDispatcher::new(
                Arc::new(StaticDirectory(None)),
                Arc::new(RecordingBot::default()),
                Arc::new(RecordingMail::default()),
                defaults(),
            ));

            // No workers consuming: capacity 1, second enqueue must fail.
            let (tx, _rx) = mpsc::channel(1);
            let queue = NotificationQueue { tx };
            let _ = dispatcher; // workers intentionally not spawned
            assert!(queue.enqueue(job()));
            assert!(!queue.enqueue(job()));
        }
    }

    mod report {
        use super::*;

        #[test]
        fn report_contains_contact_and_summary() {
            let (subject, text, html) = render_report("Acme", &job(), 10);

            assert!(subject.contains("Meiramgul"));
            assert!(text.contains("Phone: +77012345678"));
            assert!(text.contains("Temperature: hot"));
            assert!(text.contains("Visitor: хочу заказать"));
            assert!(html.contains("<b>Name:</b> Meiramgul"));
        }

        #[test]
        fn report_window_keeps_most_recent_lines() {
            let mut j = job();
            j.history = (0..30)
                .map(|i| HistoryEntry::visitor(format!("line{i}")))
                .collect();

            let (_, text, _) = render_report("Acme", &j, 5);

            assert!(!text.contains("line24"));
            assert!(text.contains("line25"));
            assert!(text.contains("line29"));
        }

        #[test]
        fn html_is_escaped() {
            let mut j = job();
            j.contact_name = "<script>".to_string();
            let (_, _, html) = render_report("Acme", &j, 10);
            assert!(html.contains("&lt;script&gt;"));
        }
    }
}
