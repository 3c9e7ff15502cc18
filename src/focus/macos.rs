//! macOS focus probe over the Accessibility (AX) API.
//!
//! Requires the Accessibility permission.  Without it the system-wide
//! focused element cannot be read and the probe reports `Unknown`.

use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::string::CFString;

use super::{classify_element, FocusInspector, FocusState};

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXUIElementCreateSystemWide() -> *mut std::ffi::c_void;
    fn AXUIElementCopyAttributeValue(
        element: *mut std::ffi::c_void,
        attribute: *const std::ffi::c_void,
        value: *mut *mut std::ffi::c_void,
    ) -> i32;
    fn AXUIElementIsAttributeSettable(
        element: *mut std::ffi::c_void,
        attribute: *const std::ffi::c_void,
        settable: *mut u8,
    ) -> i32;
}

/// kAXErrorSuccess
const AX_SUCCESS: i32 = 0;

/// Reads the focused element's role and value settability.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessibilityInspector;

impl FocusInspector for AccessibilityInspector {
    fn inspect(&self) -> FocusState {
        let Some(element) = focused_element() else {
            log::debug!("focus: could not read the focused UI element");
            return FocusState::Unknown;
        };

        let role = copy_attribute(&element, "AXRole").and_then(|v| v.downcast::<CFString>());
        let role = role.map(|r| r.to_string());
        log::debug!("focus: focused element role = {:?}", role);

        classify_element(role.as_deref(), || value_is_settable(&element))
    }
}

/// The system-wide focused UI element, owned (released on drop).
fn focused_element() -> Option<CFType> {
    // SAFETY: AXUIElementCreateSystemWide follows the Create rule; the
    // returned reference is owned by the wrapper.
    let system_wide = unsafe { AXUIElementCreateSystemWide() };
    if system_wide.is_null() {
        return None;
    }
    let system_wide = unsafe { CFType::wrap_under_create_rule(system_wide as CFTypeRef) };
    copy_attribute(&system_wide, "AXFocusedUIElement")
}

/// Copy one attribute value of `element`, or `None` on any AX error.
fn copy_attribute(element: &CFType, attribute: &str) -> Option<CFType> {
    let name = CFString::new(attribute);
    let mut value: *mut std::ffi::c_void = std::ptr::null_mut();

    // SAFETY: `element` and `name` are live CF objects for the duration of the
    // call; a non-null `value` is returned under the Copy (create) rule.
    let status = unsafe {
        AXUIElementCopyAttributeValue(
            element.as_CFTypeRef() as *mut _,
            name.as_concrete_TypeRef() as *const _,
            &mut value,
        )
    };

    if status != AX_SUCCESS || value.is_null() {
        return None;
    }
    Some(unsafe { CFType::wrap_under_create_rule(value as CFTypeRef) })
}

fn value_is_settable(element: &CFType) -> bool {
    let name = CFString::new("AXValue");
    let mut settable: u8 = 0;

    // SAFETY: both CF objects outlive the call; `settable` is a valid
    // out-pointer to a Boolean.
    let status = unsafe {
        AXUIElementIsAttributeSettable(
            element.as_CFTypeRef() as *mut _,
            name.as_concrete_TypeRef() as *const _,
            &mut settable,
        )
    };

    status == AX_SUCCESS && settable != 0
}
