//! Defines the Component trait, the common interface for the pipeline
//! stages that hang off the session loop. Each stage runs on its own
//! thread, consumes data from the preceding stage over a channel,
//! processes it, and passes new data to the subsequent stage. The
//! session loop only ever performs a non-blocking send into the first
//! stage, so a slow sink can never stall reconciliation.

use log::{info, warn};
use std::fmt::Display;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

/// What a stage can fail with while shutting down.
#[derive(Debug)]
pub enum ComponentError {
    /// A sink failed to flush.
    Io(std::io::Error),
}

/// A stage in the narration/output pipeline. All structs that perform
/// a processing step behind the session loop implement Component, so
/// that they can be spawned with [`run_component`] or [`run_sink`].
pub trait Component: Display {
    /// What the stage consumes.
    type InData;
    /// What the stage produces.
    type OutData;

    /// Converts one input into one output.
    fn convert(&mut self, input: Self::InData) -> Self::OutData;

    /// Cleans up at termination of the pipeline.
    fn finalize(&mut self) -> Result<(), ComponentError>;
}

/// Runs the given Component on its own thread. On receiving data on
/// the input channel, the Component converts it and sends the result
/// to the output channel. The thread terminates when the input channel
/// closes.
pub fn run_component<C>(
    mut component: Box<C>,
    input: Receiver<C::InData>,
    output: Sender<C::OutData>,
) -> JoinHandle<()>
where
    C: Component + Send + 'static,
    C::InData: Send + 'static,
    C::OutData: Send + 'static,
{
    thread::spawn(move || {
        while let Ok(data) = input.recv() {
            let out_data = component.convert(data);
            if let Err(error) = output.send(out_data) {
                warn!("{} : receiver hung up: {}.", component, error);
            }
        }

        if let Err(component_error) = component.finalize() {
            warn!(
                "{} : error during termination : {:?}.",
                component, component_error
            );
        }
        info!("{} : terminated.", component);
    })
}

/// Like [`run_component`], for terminal stages whose output is `()`.
/// The converted unit values are discarded instead of being sent
/// anywhere.
pub fn run_sink<C>(mut component: Box<C>, input: Receiver<C::InData>) -> JoinHandle<()>
where
    C: Component<OutData = ()> + Send + 'static,
    C::InData: Send + 'static,
{
    thread::spawn(move || {
        while let Ok(data) = input.recv() {
            component.convert(data);
        }

        if let Err(component_error) = component.finalize() {
            warn!(
                "{} : error during termination : {:?}.",
                component, component_error
            );
        }
        info!("{} : terminated.", component);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::mpsc::channel;

    struct AddOne {}

    impl Component for AddOne {
        type InData = i32;
        type OutData = i32;

        fn convert(&mut self, input: i32) -> i32 {
            input + 1
        }

        fn finalize(&mut self) -> Result<(), ComponentError> {
            Ok(())
        }
    }

    impl fmt::Display for AddOne {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "AddOne")
        }
    }

    /// Writing a value to the component's input produces that value,
    /// converted, on the component's output.
    #[test]
    fn component_converts_over_channels() {
        let (test_tx, stage_rx) = channel::<i32>();
        let (stage_tx, test_rx) = channel::<i32>();

        run_component(Box::new(AddOne {}), stage_rx, stage_tx);

        assert_eq!(test_tx.send(0), Ok(()));
        assert_eq!(test_rx.recv(), Ok(1));
    }

    #[test]
    fn components_chain() {
        let (test_tx, a_rx) = channel::<i32>();
        let (a_tx, b_rx) = channel::<i32>();
        let (b_tx, test_rx) = channel::<i32>();

        run_component(Box::new(AddOne {}), a_rx, a_tx);
        run_component(Box::new(AddOne {}), b_rx, b_tx);

        assert_eq!(test_tx.send(0), Ok(()));
        assert_eq!(test_rx.recv(), Ok(2));
    }

    #[test]
    fn sink_terminates_when_input_closes() {
        struct Discard {}

        impl Component for Discard {
            type InData = i32;
            type OutData = ();

            fn convert(&mut self, _input: i32) {}

            fn finalize(&mut self) -> Result<(), ComponentError> {
                Ok(())
            }
        }

        impl fmt::Display for Discard {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "Discard")
            }
        }

        let (tx, rx) = channel::<i32>();
        let handle = run_sink(Box::new(Discard {}), rx);
        tx.send(7).unwrap();
        drop(tx);
        handle.join().unwrap();
    }
}
