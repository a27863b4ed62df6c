/*!
# Mob Timer DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant les tests du client Mob Timer avec:
- Transport SSE simulé, sans serveur
- Builders d'événements conformes au flux serveur
- Harness de test en temps virtuel
*/

pub mod event_builders;
pub mod mock_transport;
pub mod test_utils;

pub use event_builders::StreamEventBuilder;
pub use mock_transport::MockTransport;
pub use test_utils::{RecordingUi, TestHarness, UiState};
