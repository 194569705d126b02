//! Temperature classification service.
//!
//! Wraps the AI oracle with the fallback the funnel requires: a lead that
//! cannot be classified is warm, never an error. Invoked once per lead,
//! at the moment of confirmation.

use std::sync::Arc;

use tracing::warn;

use crate::domain::lead::{classification_prompt, parse_temperature, HistoryEntry, Temperature};
use crate::ports::{AiOracle, OracleEndpoint, OracleRequest, OracleRole};

/// Default narrative recorded when the oracle is unreachable.
const FALLBACK_NOTES: &str = "Classifier unavailable; defaulted to warm.";

/// Oracle-backed temperature classifier with a keyword fallback.
pub struct TemperatureClassifier {
    oracle: Arc<dyn AiOracle>,
}

impl TemperatureClassifier {
    /// Creates a classifier over the given oracle.
    pub fn new(oracle: Arc<dyn AiOracle>) -> Self {
        Self { oracle }
    }

    /// Classifies a finished conversation.
    ///
    /// Returns the temperature plus the narrative justification. Any
    /// oracle failure degrades to warm with a stock note.
    pub async fn classify(
        &self,
        history: &[HistoryEntry],
        endpoint: Option<OracleEndpoint>,
    ) -> (Temperature, String) {
        let request = OracleRequest::new()
            .with_message(OracleRole::User, classification_prompt(history))
            .with_endpoint(endpoint);

        match self.oracle.complete(request).await {
            Ok(narrative) => {
                let temperature = parse_temperature(&narrative);
                (temperature, narrative)
            }
            Err(err) => {
                warn!(error = %err, "temperature classification failed");
                (Temperature::Warm, FALLBACK_NOTES.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::ports::OracleError;

    struct ScriptedOracle {
        responses: Mutex<Vec<Result<String, OracleError>>>,
    }

    impl ScriptedOracle {
        fn returning(result: Result<String, OracleError>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(vec![result]),
            })
        }
    }

    #[async_trait]
    impl AiOracle for ScriptedOracle {
        async fn complete(&self, _request: OracleRequest) -> Result<String, OracleError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(OracleError::unavailable("exhausted")))
        }
    }

    #[tokio::test]
    async fn parses_oracle_narrative() {
        let oracle = ScriptedOracle::returning(Ok(
            "Very responsive, shared contacts immediately - a hot lead.".to_string(),
        ));
        let classifier = TemperatureClassifier::new(oracle);

        let (temperature, notes) = classifier.classify(&[], None).await;

        assert_eq!(temperature, Temperature::Hot);
        assert!(notes.contains("hot lead"));
    }

    #[tokio::test]
    async fn oracle_failure_defaults_to_warm() {
        let oracle = ScriptedOracle::returning(Err(OracleError::unavailable("down")));
        let classifier = TemperatureClassifier::new(oracle);

        let (temperature, notes) = classifier.classify(&[], None).await;

        assert_eq!(temperature, Temperature::Warm);
        assert_eq!(notes, FALLBACK_NOTES);
    }

    #[tokio::test]
    async fn unparseable_narrative_is_warm() {
        let oracle =
            ScriptedOracle::returning(Ok("The visitor asked about prices twice.".to_string()));
        let classifier = TemperatureClassifier::new(oracle);

        let (temperature, _) = classifier.classify(&[], None).await;

        assert_eq!(temperature, Temperature::Warm);
    }
}
