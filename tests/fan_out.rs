use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use priolog::{LogError, Logger};

#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.borrow().clone())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured(name: &str, threshold: u32) -> (Rc<Logger>, Capture) {
    let capture = Capture::default();
    let logger = Logger::console().with_console_writer(capture.clone());
    logger.set_threshold(threshold.into());
    logger.set_simulated_time(Some(name));
    (Rc::new(logger), capture)
}

#[test]
fn each_target_applies_its_own_threshold() {
    let (a, a_out) = captured("A", 1);
    let (b, b_out) = captured("B", 3);
    let (c, c_out) = captured("C", 2);
    a.register_fan_out(&b);
    a.register_fan_out(&c);

    a.log(3, "three").unwrap();
    a.log(2, "two").unwrap();
    a.log(1, "one").unwrap();

    assert_eq!(a_out.lines(), vec!["A: one"]);
    assert_eq!(b_out.lines(), vec!["B: three", "B: two", "B: one"]);
    assert_eq!(c_out.lines(), vec!["C: two", "C: one"]);
}

#[test]
fn deregistered_target_stops_receiving() {
    let (a, _a_out) = captured("A", 2);
    let (b, b_out) = captured("B", 2);
    let (c, c_out) = captured("C", 2);
    a.register_fan_out(&b);
    a.register_fan_out(&c);

    a.log(1, "before").unwrap();
    a.deregister_fan_out(&b);
    a.log(1, "after").unwrap();

    assert_eq!(b_out.lines(), vec!["B: before"]);
    assert_eq!(c_out.lines(), vec!["C: before", "C: after"]);
    assert_eq!(a.fan_out_len(), 1);

    // Removing something that is not registered is a no-op.
    a.deregister_fan_out(&b);
    assert_eq!(a.fan_out_len(), 1);
}

#[test]
fn duplicate_registration_delivers_twice() {
    let (a, _a_out) = captured("A", 2);
    let (b, b_out) = captured("B", 2);
    a.register_fan_out(&b);
    a.register_fan_out(&b);

    a.log(1, "echo").unwrap();
    assert_eq!(b_out.lines(), vec!["B: echo", "B: echo"]);
}

#[test]
fn dropped_target_is_skipped() {
    let (a, a_out) = captured("A", 2);
    {
        let (b, _b_out) = captured("B", 2);
        a.register_fan_out(&b);
        assert_eq!(a.fan_out_len(), 1);
    }

    a.log(1, "still fine").unwrap();
    assert_eq!(a_out.lines(), vec!["A: still fine"]);
    assert_eq!(a.fan_out_len(), 0);
}

#[test]
fn self_registration_is_ignored() {
    let (a, a_out) = captured("A", 2);
    a.register_fan_out(&a);
    assert_eq!(a.fan_out_len(), 0);

    a.log(1, "once").unwrap();
    assert_eq!(a_out.lines(), vec!["A: once"]);
}

#[test]
fn forwarding_chains_and_cycles_terminate() {
    let (a, a_out) = captured("A", 2);
    let (b, b_out) = captured("B", 2);
    let (c, c_out) = captured("C", 2);
    a.register_fan_out(&b);
    b.register_fan_out(&c);
    c.register_fan_out(&a);

    a.log(1, "loop").unwrap();

    assert_eq!(a_out.lines(), vec!["A: loop"]);
    assert_eq!(b_out.lines(), vec!["B: loop"]);
    assert_eq!(c_out.lines(), vec!["C: loop"]);
}

#[test]
fn priority_zero_reaches_targets_then_fails_once() {
    let (a, a_out) = captured("A", 0);
    let (b, b_out) = captured("B", 0);
    a.register_fan_out(&b);

    let err = a.log(0, "halt").unwrap_err();
    match err {
        LogError::Fatal { message } => assert_eq!(message, "halt\nStopped"),
        other => panic!("expected fatal, got {other:?}"),
    }
    assert_eq!(a_out.lines(), vec!["A: halt", "A: Stopped"]);
    assert_eq!(b_out.lines(), vec!["B: halt", "B: Stopped"]);
}

#[test]
fn fan_out_to_file_targets() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().to_str().unwrap();

    let source = Logger::new(Some("source.log"), Some(dir), 1).unwrap();
    source.set_simulated_time(Some("t=0"));
    let sink = Rc::new(Logger::new(Some("sink.log"), Some(dir), 3).unwrap());
    sink.set_simulated_time(Some("t=0"));
    source.register_fan_out(&sink);

    source.log(3, "sink only").unwrap();
    source.log(1, "everywhere").unwrap();

    assert_eq!(
        fs::read_to_string(tmp.path().join("source.log")).unwrap(),
        "t=0: everywhere\n"
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("sink.log")).unwrap(),
        "t=0: sink only\nt=0: everywhere\n"
    );
}

fn broken_file_target(tmp: &tempfile::TempDir, threshold: u32) -> Rc<Logger> {
    let dir = tmp.path().join("removed");
    let target = Logger::new(Some("b.log"), Some(dir.to_str().unwrap()), threshold).unwrap();
    fs::remove_dir_all(&dir).unwrap();
    Rc::new(target)
}

#[test]
fn failing_target_does_not_starve_later_targets() {
    let tmp = tempfile::tempdir().unwrap();
    let (a, a_out) = captured("A", 2);
    let b = broken_file_target(&tmp, 2);
    let (c, c_out) = captured("C", 2);
    a.register_fan_out(&b);
    a.register_fan_out(&c);

    let err = a.log(1, "warn").unwrap_err();
    assert!(matches!(err, LogError::Open { .. }));
    assert_eq!(a_out.lines(), vec!["A: warn"]);
    assert_eq!(c_out.lines(), vec!["C: warn"]);
}

#[test]
fn priority_zero_stays_fatal_when_a_target_cannot_open() {
    let tmp = tempfile::tempdir().unwrap();
    let (a, a_out) = captured("A", 0);
    let b = broken_file_target(&tmp, 0);
    let (c, c_out) = captured("C", 0);
    a.register_fan_out(&b);
    a.register_fan_out(&c);

    let err = a.log(0, "halt").unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(a_out.lines(), vec!["A: halt", "A: Stopped"]);
    assert_eq!(c_out.lines(), vec!["C: halt", "C: Stopped"]);
}

#[test]
fn own_open_failure_still_reaches_targets() {
    let tmp = tempfile::tempdir().unwrap();
    let a = broken_file_target(&tmp, 2);
    let (c, c_out) = captured("C", 2);
    a.register_fan_out(&c);

    assert!(matches!(a.log(1, "m").unwrap_err(), LogError::Open { .. }));
    assert_eq!(c_out.lines(), vec!["C: m"]);
    assert!(!a.is_open());
}
