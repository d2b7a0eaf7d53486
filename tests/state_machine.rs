use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::{Duration, Instant};
use dyesub_rs::{
    Error, JobOptions, PaperPolicy, Phase, Printer, PrinterModel, SpooledJob, Transport,
    command::Command,
    readback::ReadbackSample
};
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Read(Vec<u8>),
    Write(Vec<u8>)
}

/// Printer answering reads from a script, and recording everything
struct ScriptedPrinter {
    script: VecDeque<Vec<u8>>,
    events: Vec<Event>,
    /// Most bytes a single write takes
    max_write: usize,
    /// Flag raised once that many reads happened
    raise_after: Option<(usize, Arc<AtomicBool>)>,
    reads: usize,
    /// Zero pad scripted reads to the asked length
    pad: bool
}

impl ScriptedPrinter {
    fn new(script: Vec<Vec<u8>>) -> ScriptedPrinter {
        ScriptedPrinter {
            script: script.into_iter().collect(),
            events: Vec::new(),
            max_write: usize::MAX,
            raise_after: None,
            reads: 0,
            pad: true
        }
    }

    /// Hands scripted reads out at their own length, like a device sending less than asked
    fn with_short_reads(mut self) -> ScriptedPrinter {
        self.pad = false;
        self
    }

    fn with_max_write(mut self, max_write: usize) -> ScriptedPrinter {
        self.max_write = max_write;
        self
    }

    fn raising_after(mut self, reads: usize, flag: Arc<AtomicBool>) -> ScriptedPrinter {
        self.raise_after = Some((reads, flag));
        self
    }

    /// Events with consecutive writes merged back into blocks
    fn blocks(&self) -> Vec<Event> {
        let mut merged: Vec<Event> = Vec::new();
        for event in &self.events {
            match (merged.last_mut(), event) {
                (Some(Event::Write(block)), Event::Write(bytes)) => block.extend_from_slice(bytes),
                _ => merged.push(event.clone())
            }
        }
        merged
    }

    fn written(&self) -> usize {
        self.events.iter().map(|event| match event {
            Event::Write(bytes) => bytes.len(),
            Event::Read(_) => 0
        }).sum()
    }
}

impl Transport for ScriptedPrinter {
    fn read_status(&mut self, len: usize) -> Result<ReadbackSample, Error> {
        self.reads += 1;
        if let Some((after, flag)) = &self.raise_after {
            if self.reads >= *after {
                flag.store(true, Ordering::Relaxed);
            }
        }
        let mut bytes = self.script.pop_front()
            .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::TimedOut, "printer stopped answering")))?;
        if self.pad {
            bytes.resize(len, 0x00);
        }
        self.events.push(Event::Read(bytes.clone()));
        Ok(ReadbackSample::new(bytes))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let count = bytes.len().min(self.max_write);
        if count > 0 {
            self.events.push(Event::Write(bytes[..count].to_vec()));
        }
        Ok(count)
    }
}

/// Readback matching `phase`, reporting `paper` where the model reports paper
fn readback(model: PrinterModel, phase: Phase, paper: u8) -> Vec<u8> {
    let profile = model.profile();
    let mut bytes: Vec<u8> = profile.pattern(phase).unwrap().fields().iter()
        .map(|expect| expect.byte().unwrap_or(0x00))
        .collect();
    if let Some(offset) = profile.paper_readback_offset() {
        bytes[offset] = paper;
    }
    bytes
}

fn es1(phase: Phase) -> Vec<u8> {
    readback(PrinterModel::SelphyES1, phase, 0x01)
}

/// ES1 job on paper 0x11, plane `k` filled with `k`
fn es1_job(monochrome: bool, plane_len: usize) -> Vec<u8> {
    let mut job = vec![0x40, 0x00, if monochrome { 0x10 } else { 0x20 }, 0x11];
    job.resize(12, 0x00);
    let planes = if monochrome { 1 } else { 3 };
    for k in 1..=planes {
        job.extend_from_slice(&[0x40, 0x01, k, 0x00]);
        job.extend_from_slice(&(plane_len as u32).to_le_bytes());
        job.extend_from_slice(&[0x00; 4]);
        job.extend(vec![k; plane_len]);
    }
    job
}

/// Black and white ES40 job on paper 0x02, the 12 byte footer filled with 0xee
fn es40_job() -> Vec<u8> {
    let plane_len = 698880u32;
    let mut job = vec![0x40, 0x00, 0x02, 0x01];
    job.resize(12, 0x00);
    job.extend_from_slice(&plane_len.to_le_bytes());
    job.extend_from_slice(&[0x40, 0x01, 0x01, 0x00]);
    job.resize(job.len() + 8, 0x00);
    job.resize(job.len() + plane_len as usize, 0x55);
    job.extend(vec![0xee; 12]);
    job
}

fn plane_block(job: &[u8], k: usize, plane_len: usize) -> Vec<u8> {
    let start = 12 + (k - 1) * (12 + plane_len);
    job[start..start + 12 + plane_len].to_vec()
}

fn options() -> JobOptions {
    JobOptions::builder()
        .with_poll_interval(Duration::from_millis(0))
        .with_buffer_capacity(7)
        .build()
}

#[test]
fn planes_wait_for_their_ready_readback() {
    let raw = es1_job(false, 20);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let busy = vec![0x02, 0x00, 0x00, 0x00, 0x02, 0x01, 0x01, 0x00];
    let transport = ScriptedPrinter::new(vec![
        busy.clone(),
        es1(Phase::Init),
        // Still reporting init, the first plane must wait
        es1(Phase::Init),
        es1(Phase::Ready(1)),
        es1(Phase::Ready(1)),
        es1(Phase::Ready(2)),
        es1(Phase::Ready(3)),
        es1(Phase::Done)
    ]).with_max_write(5);
    let mut printer = Printer::new(transport, options());
    assert_eq!(printer.print(&job).unwrap(), 1);

    let mut busy_sample = busy;
    busy_sample.resize(12, 0x00);
    assert_eq!(printer.transport().blocks(), vec![
        Event::Read(busy_sample),
        Event::Read(es1(Phase::Init)),
        Event::Write(raw[..12].to_vec()),
        Event::Read(es1(Phase::Init)),
        Event::Read(es1(Phase::Ready(1))),
        Event::Write(plane_block(&raw, 1, 20)),
        Event::Read(es1(Phase::Ready(1))),
        Event::Read(es1(Phase::Ready(2))),
        Event::Write(plane_block(&raw, 2, 20)),
        Event::Read(es1(Phase::Ready(3))),
        Event::Write(plane_block(&raw, 3, 20)),
        Event::Read(es1(Phase::Done))
    ]);
}

#[test]
fn black_and_white_job_sends_one_plane() {
    let raw = es1_job(true, 16);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let transport = ScriptedPrinter::new(vec![
        es1(Phase::Init),
        es1(Phase::Ready(1)),
        es1(Phase::Ready(2))
    ]);
    let mut printer = Printer::new(transport, options());
    printer.print(&job).unwrap();
    assert_eq!(printer.transport().blocks(), vec![
        Event::Read(es1(Phase::Init)),
        Event::Write(raw[..12].to_vec()),
        Event::Read(es1(Phase::Ready(1))),
        Event::Write(plane_block(&raw, 1, 16)),
        Event::Read(es1(Phase::Ready(2)))
    ]);
}

#[test]
fn footer_goes_out_after_done() {
    let plane_len = 10;
    let mut raw = vec![0x40, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    raw.extend_from_slice(&(plane_len as u32).to_le_bytes());
    for k in 1..=3u8 {
        raw.extend_from_slice(&[0x40, 0x01, k, 0x00]);
        raw.resize(raw.len() + 8, 0x00);
        raw.extend(vec![k; plane_len]);
    }
    raw.extend(vec![0xee; 12]);
    let job = SpooledJob::read(&raw[..]).unwrap();
    assert_eq!(job.descriptor().model(), PrinterModel::SelphyES3);

    let es3 = |phase| readback(PrinterModel::SelphyES3, phase, 0x00);
    let transport = ScriptedPrinter::new(vec![
        es3(Phase::Init),
        es3(Phase::Ready(1)),
        es3(Phase::Ready(2)),
        es3(Phase::Ready(3)),
        es3(Phase::Done)
    ]);
    let mut printer = Printer::new(transport, options());
    printer.print(&job).unwrap();
    let blocks = printer.transport().blocks();
    assert_eq!(blocks.len(), 10);
    assert_eq!(blocks[8], Event::Read(es3(Phase::Done)));
    assert_eq!(blocks[9], Event::Write(vec![0xee; 12]));
    assert_eq!(printer.transport().written(), raw.len());
}

#[test]
fn done_readback_finishes_the_last_plane() {
    let raw = es1_job(false, 4);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let transport = ScriptedPrinter::new(vec![
        es1(Phase::Init),
        es1(Phase::Ready(1)),
        es1(Phase::Ready(2)),
        es1(Phase::Ready(3)),
        // The last ready readback again, then done
        es1(Phase::Ready(3)),
        es1(Phase::Done)
    ]);
    let mut printer = Printer::new(transport, options());
    printer.print(&job).unwrap();
    assert_eq!(printer.into_inner().script.len(), 0);
}

#[test]
fn kodak_asks_for_status_before_every_read() {
    let mut raw = vec![0x03, 0x1b, 0x43, 0x48, 0x43, 0x0a, 0x00, 0x00, 0x00, 0x01];
    raw.extend_from_slice(&3u16.to_be_bytes());
    raw.extend_from_slice(&2u16.to_be_bytes());
    raw.extend_from_slice(&[0x00, 0x01, 0x00]);
    raw.extend(vec![0x80; 18]);
    raw.extend(vec![0xff; 17]);
    let job = SpooledJob::read(&raw[..]).unwrap();

    let mut ready = vec![0x01, 0x03, 0x00];
    ready.resize(58, 0x00);
    let mut init = vec![0x01];
    init.resize(58, 0x00);
    let transport = ScriptedPrinter::new(vec![init.clone(), ready.clone(), vec![0x01, 0x02]]);
    // Large enough for every block to go out in one write
    let options = JobOptions::builder()
        .with_poll_interval(Duration::from_millis(0))
        .build();
    let mut printer = Printer::new(transport, options);
    printer.print(&job).unwrap();

    let query = Event::Write(Command::KodakStatusQuery.as_bytes());
    let mut done = vec![0x01, 0x02];
    done.resize(58, 0x00);
    assert_eq!(printer.transport().events, vec![
        Event::Write(Command::KodakAttention.as_bytes()),
        query.clone(),
        Event::Read(init),
        Event::Write(raw[..17].to_vec()),
        query.clone(),
        Event::Read(ready),
        Event::Write(vec![0x80; 18]),
        query,
        Event::Read(done),
        Event::Write(vec![0xff; 17])
    ]);
}

fn es1_copy_script() -> Vec<Vec<u8>> {
    vec![
        es1(Phase::Init),
        es1(Phase::Ready(1)),
        es1(Phase::Ready(2)),
        es1(Phase::Ready(3)),
        es1(Phase::Done)
    ]
}

#[test]
fn copies_resend_the_spooled_job() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let transport = ScriptedPrinter::new([es1_copy_script(), es1_copy_script(), es1_copy_script()].concat());
    let options = JobOptions::builder()
        .with_poll_interval(Duration::from_millis(0))
        .with_copies(3)
        .build();
    let mut printer = Printer::new(transport, options);
    assert_eq!(printer.print(&job).unwrap(), 3);
    assert_eq!(printer.transport().written(), 3 * raw.len());
}

#[test]
fn termination_stops_after_the_current_copy() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let terminate = Arc::new(AtomicBool::new(false));
    // Raised while the first copy waits for its second plane
    let transport = ScriptedPrinter::new([es1_copy_script(), es1_copy_script()].concat())
        .raising_after(3, Arc::clone(&terminate));
    let options = JobOptions::builder()
        .with_poll_interval(Duration::from_millis(0))
        .with_copies(3)
        .with_terminate(terminate)
        .build();
    let mut printer = Printer::new(transport, options);
    assert_eq!(printer.print(&job).unwrap(), 1);
    // The copy in flight was completed
    assert_eq!(printer.transport().written(), raw.len());
}

#[test]
fn termination_before_the_job_still_prints_once() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let options = JobOptions::builder()
        .with_poll_interval(Duration::from_millis(0))
        .with_copies(2)
        .with_terminate(Arc::new(AtomicBool::new(true)))
        .build();
    let mut printer = Printer::new(ScriptedPrinter::new(es1_copy_script()), options);
    assert_eq!(printer.print(&job).unwrap(), 1);
}

#[test]
fn transport_failure_aborts_the_job() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let transport = ScriptedPrinter::new(vec![es1(Phase::Init), es1(Phase::Ready(1))]);
    let mut printer = Printer::new(transport, options());
    match printer.print(&job) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
        other => panic!("Unexpected result {:?}", other)
    }
    // Init block and first plane only
    assert_eq!(printer.transport().written(), 12 + 20);
}

#[test]
fn refused_write_aborts_the_job() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let transport = ScriptedPrinter::new(es1_copy_script()).with_max_write(0);
    let mut printer = Printer::new(transport, options());
    match printer.print(&job) {
        Err(Error::WriteZero) => (),
        other => panic!("Unexpected result {:?}", other)
    }
}

#[test]
fn wrong_paper_can_abort() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let transport = ScriptedPrinter::new(vec![readback(PrinterModel::SelphyES1, Phase::Init, 0x03)]);
    let options = JobOptions::builder()
        .with_poll_interval(Duration::from_millis(0))
        .with_paper_policy(PaperPolicy::Abort)
        .build();
    let mut printer = Printer::new(transport, options);
    match printer.print(&job) {
        Err(Error::PaperMismatch{expected, found}) => assert_eq!((expected, found), (0x01, 0x03)),
        other => panic!("Unexpected result {:?}", other)
    }
    assert_eq!(printer.transport().written(), 0);
}

#[test]
fn wrong_paper_waits_by_default() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let wrong = readback(PrinterModel::SelphyES1, Phase::Init, 0x03);
    let mut script = vec![wrong.clone(), wrong];
    script.extend(es1_copy_script());
    let mut printer = Printer::new(ScriptedPrinter::new(script), options());
    assert_eq!(printer.print(&job).unwrap(), 1);
    assert_eq!(printer.transport().written(), raw.len());
}

#[test]
fn short_readbacks_never_open_the_job() {
    let job = SpooledJob::read(&es40_job()[..]).unwrap();
    assert_eq!(job.descriptor().model(), PrinterModel::SelphyES40);
    // All zeros fits the ES40 init pattern once padded to full length
    let transport = ScriptedPrinter::new(vec![Vec::new(), vec![0x00; 5], vec![0x00; 11]]).with_short_reads();
    let mut printer = Printer::new(transport, options());
    match printer.print(&job) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
        other => panic!("Unexpected result {:?}", other)
    }
    assert_eq!(printer.transport().written(), 0);
}

#[test]
fn full_length_readback_opens_the_es40_job() {
    let raw = es40_job();
    let job = SpooledJob::read(&raw[..]).unwrap();
    let transport = ScriptedPrinter::new(vec![Vec::new(), readback(PrinterModel::SelphyES40, Phase::Init, 0x33)])
        .with_short_reads();
    let mut printer = Printer::new(transport, options());
    assert!(printer.print(&job).is_err());
    assert_eq!(printer.transport().blocks()[2], Event::Write(raw[..16].to_vec()));
}

/// ES1 script where `repeats` identical init readbacks hold up the first plane
fn stalled_script(repeats: usize) -> Vec<Vec<u8>> {
    let mut script = vec![es1(Phase::Init)];
    script.extend(vec![es1(Phase::Init); repeats]);
    script.extend(es1_copy_script().into_iter().skip(1));
    script
}

#[test]
fn unchanged_readbacks_wait_for_the_poll_interval() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let options = JobOptions::builder()
        .with_poll_interval(Duration::from_millis(30))
        .build();
    let mut printer = Printer::new(ScriptedPrinter::new(stalled_script(3)), options);
    let started = Instant::now();
    printer.print(&job).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(90), "waited only {:?}", started.elapsed());
}

#[test]
fn changing_readbacks_do_not_wait() {
    let raw = es1_job(false, 8);
    let job = SpooledJob::read(&raw[..]).unwrap();
    let options = JobOptions::builder()
        .with_poll_interval(Duration::from_secs(5))
        .build();
    let mut printer = Printer::new(ScriptedPrinter::new(es1_copy_script()), options);
    let started = Instant::now();
    printer.print(&job).unwrap();
    assert!(started.elapsed() < Duration::from_secs(5), "waited {:?}", started.elapsed());
}
