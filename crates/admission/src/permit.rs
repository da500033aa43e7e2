use crate::error::GateError;
use crate::gate::{Gate, Grant};
use crate::RequesterId;

/// A unit held by a requester, given back to the gate when dropped.
pub struct Permit<'a, R: RequesterId> {
    gate: &'a Gate<R>,
    id: R,
    grant: Grant,
    released: bool,
}

impl<'a, R: RequesterId> Permit<'a, R> {
    pub(crate) fn new(gate: &'a Gate<R>, id: R, grant: Grant) -> Self {
        Self {
            gate,
            id,
            grant,
            released: false,
        }
    }

    pub fn id(&self) -> R {
        self.id
    }

    pub fn grant(&self) -> Grant {
        self.grant
    }

    pub fn release(mut self) -> Result<(), GateError> {
        self.released = true;
        self.gate.release(self.id).map(|_| ())
    }
}

impl<R: RequesterId> Drop for Permit<'_, R> {
    fn drop(&mut self) {
        if !self.released {
            // Only fails if the unit was already given back through the gate
            let _ = self.gate.release(self.id);
        }
    }
}
