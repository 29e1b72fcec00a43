//! Orchestrator wired to scripted collaborators.

use std::sync::Arc;
use std::time::Duration;

use ledgersim::application::Orchestrator;
use ledgersim::port::RunEvent;
use ledgersim::testkit::launcher::{LaunchScript, ScriptedLauncher};
use ledgersim::testkit::observer::RecordingObserver;
use ledgersim::testkit::provisioner::{ProvisionScript, ScriptedProvisioner};
use ledgersim::testkit::Timeline;

pub struct Harness {
    pub timeline: Timeline,
    pub launcher: ScriptedLauncher,
    pub provisioner: ScriptedProvisioner,
    pub observer: RecordingObserver,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(launch: LaunchScript, provision: ProvisionScript) -> Self {
        let timeline = Timeline::new();
        let launcher = ScriptedLauncher::new(launch, timeline.clone());
        let provisioner = ScriptedProvisioner::new(provision, timeline.clone());
        let observer = RecordingObserver::new();
        let orchestrator = Orchestrator::new(
            Arc::new(launcher.clone()),
            Arc::new(provisioner.clone()),
            Arc::new(observer.clone()),
        );

        Self {
            timeline,
            launcher,
            provisioner,
            observer,
            orchestrator,
        }
    }

    /// Wait until the observer has seen an event matching `pred`.
    pub async fn until(&self, pred: impl Fn(&RunEvent) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.observer.count(&pred) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("event observed in time");
    }
}

pub const SHORT: Duration = Duration::from_millis(10);

pub fn bootstrap() -> LaunchScript {
    LaunchScript::Bootstrap { delay: SHORT }
}

pub fn provision_ok() -> ProvisionScript {
    ProvisionScript::Succeed { delay: SHORT }
}
