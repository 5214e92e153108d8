//! Hardware ID extraction from driver package INF text

use pvdrv_errors::Error;
use pvdrv_types::{DeviceIdentity, TargetArch};
use regex::Regex;

const VENDOR_ID: &str = "5853";

fn hardware_id_pattern(device: DeviceIdentity) -> Result<Regex, Error> {
    Regex::new(&format!(
        r"(?i)PCI\\VEN_{VENDOR_ID}&DEV_{}(&SUBSYS_[0-9A-F]{{8}})?(&REV_[0-9A-F]{{2}})?",
        device.code()
    ))
    .map_err(|e| Error::internal(format!("Failed to compile regex: {e}")))
}

/// Section name of a `[Name]` header line, ignoring a trailing comment
fn section_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(rest[..end].trim())
}

/// Find the hardware ID for `device` in the install section for `arch`.
///
/// Only lines between `[Inst.NT{arch}]` and the next section header are
/// searched; the first match wins. `None` when the section is missing or
/// holds no matching ID.
///
/// # Errors
///
/// Returns an error only if the pattern fails to compile.
pub fn find_hardware_id(
    inf_text: &str,
    arch: TargetArch,
    device: DeviceIdentity,
) -> Result<Option<String>, Error> {
    let pattern = hardware_id_pattern(device)?;
    let wanted = arch.install_section();

    let mut in_section = false;
    for line in inf_text.lines() {
        if let Some(name) = section_name(line) {
            if in_section {
                break;
            }
            in_section = name.eq_ignore_ascii_case(&wanted);
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some(found) = pattern.find(line) {
            return Ok(Some(found.as_str().to_string()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: &str = r#"
[Version]
Signature="$Windows NT$"
; PCI\VEN_5853&DEV_C000 outside the section must not match

[Inst.NTx86]
%XenBus.DeviceDesc% = XenBus_Inst, PCI\VEN_5853&DEV_0002

[inst.ntAMD64]  ; 64-bit
%XenBus.DeviceDesc% = XenBus_Inst, PCI\VEN_5853&DEV_0001&SUBSYS_00015853&REV_01
%XenBus.DeviceDesc% = XenBus_Inst, PCI\VEN_5853&DEV_0001

[Strings]
XenBus.DeviceDesc = "Xen PV Bus"
"#;

    #[test]
    fn first_match_in_section_wins() {
        let id = find_hardware_id(INF, TargetArch::X64, DeviceIdentity::Dev0001).unwrap();
        assert_eq!(
            id.as_deref(),
            Some(r"PCI\VEN_5853&DEV_0001&SUBSYS_00015853&REV_01")
        );
    }

    #[test]
    fn other_sections_are_ignored() {
        assert_eq!(
            find_hardware_id(INF, TargetArch::X64, DeviceIdentity::DevC000).unwrap(),
            None
        );
        assert_eq!(
            find_hardware_id(INF, TargetArch::X64, DeviceIdentity::Dev0002).unwrap(),
            None
        );
        assert_eq!(
            find_hardware_id(INF, TargetArch::X86, DeviceIdentity::Dev0002)
                .unwrap()
                .as_deref(),
            Some(r"PCI\VEN_5853&DEV_0002")
        );
    }

    #[test]
    fn bare_id_is_returned_verbatim() {
        let inf = "[Inst.NTamd64]\nfoo = bar, pci\\ven_5853&dev_c000&rev_02\n";
        assert_eq!(
            find_hardware_id(inf, TargetArch::X64, DeviceIdentity::DevC000)
                .unwrap()
                .as_deref(),
            Some(r"pci\ven_5853&dev_c000&rev_02")
        );
    }

    #[test]
    fn missing_section_yields_none() {
        assert_eq!(
            find_hardware_id("[Version]\n", TargetArch::X64, DeviceIdentity::Dev0001).unwrap(),
            None
        );
    }
}
