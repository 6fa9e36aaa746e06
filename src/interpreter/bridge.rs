//! Native bridge for the `~` operator: a single raw `syscall(2)`
//! dispatch. The return value is handed back as an uninterpreted
//! integer.

use crate::value::Value;

use super::error::RuntimeError;

/// The kernel ABI passes at most six syscall arguments; extras are
/// dropped.
pub const MAX_ARGS: usize = 6;

#[cfg(target_os = "linux")]
pub fn syscall(number: i64, args: &[Value]) -> Result<i64, RuntimeError> {
    use std::ffi::CString;

    // Text arguments become NUL-terminated buffers whose pointers must
    // stay valid across the call.
    let mut buffers: Vec<CString> = Vec::new();
    let mut words = [0 as libc::c_long; MAX_ARGS];

    for (word, arg) in words.iter_mut().zip(args.iter()) {
        *word = match arg {
            Value::Number(number) => *number as libc::c_long,
            Value::Bool(flag) => *flag as libc::c_long,
            Value::Text(text) => {
                let buffer = CString::new(text.as_bytes()).map_err(|_| {
                    RuntimeError::syscall("text argument contains a NUL byte")
                })?;
                let pointer = buffer.as_ptr() as libc::c_long;
                buffers.push(buffer);
                pointer
            }
            Value::Null | Value::Function(_) | Value::Struct(_) => 0,
        };
    }

    let result = unsafe {
        libc::syscall(
            number as libc::c_long,
            words[0],
            words[1],
            words[2],
            words[3],
            words[4],
            words[5],
        )
    };
    drop(buffers);

    Ok(result as i64)
}

#[cfg(not(target_os = "linux"))]
pub fn syscall(_number: i64, _args: &[Value]) -> Result<i64, RuntimeError> {
    Err(RuntimeError::syscall(
        "native calls are only supported on linux",
    ))
}
