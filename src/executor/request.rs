//! Request shapes
//!
//! Two shapes share the executor's retry loop: scalar queries/updates built
//! from a command ID plus a parameter list, and fully custom requests that
//! supply their own write/read/after-release hooks for composite multi-field
//! protocols.

use std::io::{Read, Write};

use crate::error::Result;
use crate::protocol::{
    read_done, read_invalidate_list, write_request, CommandId, InvalidateList, Param,
    ProtocolVersion,
};

/// One logical request, retried as a unit by the executor
///
/// A handler may be invoked several times (once per attempt); each hook must
/// tolerate re-invocation after a failed exchange.
pub trait RequestHandler {
    type Output;

    /// Encode and send the request on a fresh connection
    fn write_request(&mut self, version: ProtocolVersion, out: &mut dyn Write) -> Result<()>;

    /// Decode the response, including any trailing invalidation list
    fn read_response(&mut self, input: &mut dyn Read) -> Result<Self::Output>;

    /// Hand over the invalidation list decoded by the last successful
    /// `read_response`, if this command carries one
    fn take_invalidate_list(&mut self) -> Option<InvalidateList> {
        None
    }

    /// Runs after the connection is released and all invalidations applied,
    /// so it observes a consistent, already-invalidated cache
    fn after_release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Scalar query: fixed params out, one typed value (or nothing) back
pub struct ScalarRequest<'a, T> {
    command_id: CommandId,
    params: &'a [Param],
    decode: fn(&mut dyn Read) -> Result<T>,
}

impl<'a, T> ScalarRequest<'a, T> {
    pub fn new(
        command_id: CommandId,
        params: &'a [Param],
        decode: fn(&mut dyn Read) -> Result<T>,
    ) -> Self {
        Self {
            command_id,
            params,
            decode,
        }
    }
}

impl<T> RequestHandler for ScalarRequest<'_, T> {
    type Output = T;

    fn write_request(&mut self, version: ProtocolVersion, out: &mut dyn Write) -> Result<()> {
        write_request(out, self.command_id, self.params, version)
    }

    fn read_response(&mut self, input: &mut dyn Read) -> Result<T> {
        read_done(input)?;
        (self.decode)(input)
    }
}

/// Write command: fixed params out, no payload back, trailing invalidation
/// list decoded and handed to the executor for the two-phase cache apply
pub struct UpdateRequest<'a> {
    command_id: CommandId,
    params: &'a [Param],
    invalidations: Option<InvalidateList>,
}

impl<'a> UpdateRequest<'a> {
    pub fn new(command_id: CommandId, params: &'a [Param]) -> Self {
        Self {
            command_id,
            params,
            invalidations: None,
        }
    }
}

impl RequestHandler for UpdateRequest<'_> {
    type Output = ();

    fn write_request(&mut self, version: ProtocolVersion, out: &mut dyn Write) -> Result<()> {
        write_request(out, self.command_id, self.params, version)
    }

    fn read_response(&mut self, input: &mut dyn Read) -> Result<()> {
        read_done(input)?;
        self.invalidations = Some(read_invalidate_list(input)?);
        Ok(())
    }

    fn take_invalidate_list(&mut self) -> Option<InvalidateList> {
        self.invalidations.take()
    }
}
