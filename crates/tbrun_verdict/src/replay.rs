//! Driving the verdict monitor from a recorded waveform.

use std::path::Path;

use tbrun_common::{Logic, LogicVec, SimTime};
use tbrun_config::VerdictSettings;
use tracing::info;

use crate::error::VerdictError;
use crate::monitor::{Verdict, VerdictMonitor, VerdictSignal};
use crate::vcd::{load_vcd_file_for, LoadedWaveform};

/// One timestamp's worth of verdict signal changes.
pub type ChangeBatch = (SimTime, Vec<(VerdictSignal, Logic)>);

/// Merges the two signal histories into time-ordered batches.
///
/// Changes sharing a timestamp land in one batch, error changes first.
pub fn merge_changes(error: &[(SimTime, LogicVec)], pass: &[(SimTime, LogicVec)]) -> Vec<ChangeBatch> {
    let mut batches: Vec<ChangeBatch> = Vec::new();
    let (mut e, mut p) = (0, 0);
    while e < error.len() || p < pass.len() {
        let take_error = match (error.get(e), pass.get(p)) {
            (Some((te, _)), Some((tp, _))) => te <= tp,
            (Some(_), None) => true,
            _ => false,
        };
        let (at, signal, value) = if take_error {
            e += 1;
            (error[e - 1].0, VerdictSignal::Error, &error[e - 1].1)
        } else {
            p += 1;
            (pass[p - 1].0, VerdictSignal::Pass, &pass[p - 1].1)
        };
        let change = (signal, value.get(0));
        match batches.last_mut() {
            Some((t, changes)) if *t == at => changes.push(change),
            _ => batches.push((at, vec![change])),
        }
    }
    batches
}

fn locate(waveform: &LoadedWaveform, name: &str) -> Result<usize, VerdictError> {
    let idx = waveform
        .find_by_name(name)
        .ok_or_else(|| VerdictError::SignalNotFound(name.to_string()))?;
    let signal = &waveform.signals[idx];
    if signal.width != 1 {
        return Err(VerdictError::NotSingleBit {
            signal: signal.path.clone(),
            width: signal.width,
        });
    }
    Ok(idx)
}

/// Decides the verdict recorded in `waveform`.
pub fn replay(waveform: &LoadedWaveform, settings: &VerdictSettings) -> Result<Verdict, VerdictError> {
    let error_idx = locate(waveform, &settings.error_signal)?;
    let pass_idx = locate(waveform, &settings.pass_signal)?;
    let mut monitor = VerdictMonitor::with_paths(
        settings,
        waveform.signals[error_idx].path.clone(),
        waveform.signals[pass_idx].path.clone(),
    );

    for (at, changes) in merge_changes(&waveform.histories[error_idx], &waveform.histories[pass_idx]) {
        if let Some(verdict) = monitor.observe(at, &changes)? {
            return Ok(verdict);
        }
    }
    monitor.finish(waveform.end)
}

/// Loads a VCD file and decides its verdict.
///
/// Only the two verdict signals' histories are kept in memory.
pub fn replay_file(path: &Path, settings: &VerdictSettings) -> Result<Verdict, VerdictError> {
    let waveform = load_vcd_file_for(
        path,
        &[settings.error_signal.as_str(), settings.pass_signal.as_str()],
    )?;
    let verdict = replay(&waveform, settings)?;
    info!(waveform = %path.display(), "{verdict}");
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcd::parse_vcd;

    fn bit(t_ns: u64, l: Logic) -> (SimTime, LogicVec) {
        (SimTime::from_ns(t_ns), LogicVec::from_logic(l))
    }

    fn dump(error: &str, pass: &str) -> String {
        format!(
            "$timescale 1ns $end\n\
             $scope module tb $end\n\
             $scope module dut $end\n\
             $var wire 1 e error_o $end\n\
             $var wire 1 p pass_o $end\n\
             $var wire 4 c count [3:0] $end\n\
             $upscope $end\n\
             $upscope $end\n\
             $enddefinitions $end\n\
             {error}\n{pass}\n"
        )
    }

    #[test]
    fn merge_groups_by_time() {
        let error = vec![bit(0, Logic::Zero), bit(5, Logic::One)];
        let pass = vec![bit(0, Logic::Zero), bit(3, Logic::One), bit(5, Logic::Zero)];
        let batches = merge_changes(&error, &pass);
        let times: Vec<SimTime> = batches.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            times,
            vec![SimTime::ZERO, SimTime::from_ns(3), SimTime::from_ns(5)]
        );
        assert_eq!(
            batches[0].1,
            vec![(VerdictSignal::Error, Logic::Zero), (VerdictSignal::Pass, Logic::Zero)]
        );
        assert_eq!(batches[2].1.len(), 2);
    }

    #[test]
    fn passing_dump() {
        let vcd = "$timescale 1ns $end\n\
                   $scope module tb $end\n\
                   $var wire 1 e error_o $end\n\
                   $var wire 1 p pass_o $end\n\
                   $upscope $end\n\
                   $enddefinitions $end\n\
                   #0\n0e\n0p\n#120\n1p\n#130\n1e\n";
        let w = parse_vcd(vcd).unwrap();
        let v = replay(&w, &VerdictSettings::default()).unwrap();
        assert_eq!(v, Verdict::Passed { at: SimTime::from_ns(120) });
    }

    #[test]
    fn error_before_pass_fails() {
        let w = parse_vcd(&dump("#0 0e 0p", "#40 1e #41 1p")).unwrap();
        let v = replay(&w, &VerdictSettings::default()).unwrap();
        assert_eq!(v, Verdict::Failed { at: SimTime::from_ns(40) });
    }

    #[test]
    fn unresolved_dump() {
        let w = parse_vcd(&dump("#0 xe 0p", "#5 1p")).unwrap();
        let err = replay(&w, &VerdictSettings::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unresolvable value in tb.dut.error_o (x or z in some or all bits) at Time 1ns."
        );
    }

    #[test]
    fn missing_signal() {
        let w = parse_vcd(&dump("", "")).unwrap();
        let settings = VerdictSettings {
            pass_signal: "done_o".to_string(),
            ..VerdictSettings::default()
        };
        assert!(matches!(
            replay(&w, &settings),
            Err(VerdictError::SignalNotFound(ref s)) if s == "done_o"
        ));
    }

    #[test]
    fn wide_signal_rejected() {
        let w = parse_vcd(&dump("", "")).unwrap();
        let settings = VerdictSettings {
            pass_signal: "count".to_string(),
            ..VerdictSettings::default()
        };
        assert!(matches!(
            replay(&w, &settings),
            Err(VerdictError::NotSingleBit { width: 4, .. })
        ));
    }

    #[test]
    fn silent_dump_has_no_verdict() {
        let w = parse_vcd(&dump("#0 0e 0p", "#900")).unwrap();
        let err = replay(&w, &VerdictSettings::default()).unwrap_err();
        assert!(matches!(err, VerdictError::NoVerdict { end, .. } if end == SimTime::from_ns(900)));
    }

    #[test]
    fn replay_file_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("adder.vcd");
        std::fs::write(&path, dump("#0 0e 0p", "#12 1p")).unwrap();
        let v = replay_file(&path, &VerdictSettings::default()).unwrap();
        assert!(v.is_pass());
    }
}
