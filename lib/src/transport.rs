// Copyright (c) 2024 The Spacemesh Foundation

//! APDU exchange abstraction for hiding underlying transport types

use crate::Error;

/// APDU-level exchange with a device.
///
/// Implementations own an open connection; dispatching a serialized request
/// APDU returns the reassembled response, status word included. The device
/// is a strictly serial endpoint, so exchanges take `&mut self` and one
/// request is in flight at a time.
pub trait Exchange {
    /// Deliver a request APDU and return the raw response bytes
    fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>, Error>;

    /// Release the underlying connection. Further exchanges fail with
    /// [`Error::Closed`].
    fn close(&mut self);
}
