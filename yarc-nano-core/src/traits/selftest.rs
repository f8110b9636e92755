//! Continuous self-test (COST) control.

/// Start/stop interface to the continuous self-test task.
///
/// The self-test exercises the YARC's buses and memories whenever the
/// machine is otherwise idle. The serial engine only starts and stops it on
/// host command; the test sequences themselves live with the implementation.
pub trait SelfTest {
    /// Begin (or resume) the self-test cycle.
    fn start(&mut self);

    /// Halt the self-test and leave the machine in a safe state.
    fn stop(&mut self);
}
