use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read, Write},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, info, warn};
use serde::Serialize;

use nvs::{gen_command, DecoderOptions, Receiver, ReceiverState, Status};

fn cli() -> Command {
    Command::new("NVS BINR decoder")
        .author(clap::crate_authors!())
        .about("Decodes the BINR stream of an NVS receiver from a file or a serial port")
        .arg_required_else_help(true)
        .arg(
            Arg::new("file")
                .value_name("file")
                .short('f')
                .long("file")
                .conflicts_with("port")
                .help("Recorded BINR stream to decode"),
        )
        .arg(
            Arg::new("port")
                .value_name("port")
                .short('p')
                .long("port")
                .help("Serial port the receiver is connected to"),
        )
        .arg(
            Arg::new("baud")
                .value_name("baud")
                .short('s')
                .long("baud")
                .default_value("115200")
                .value_parser(value_parser!(u32))
                .help("Baud rate of the serial port"),
        )
        .arg(
            Arg::new("options")
                .value_name("options")
                .short('o')
                .long("options")
                .default_value("")
                .help("Decoder options, for example \"-EPHALL -TADJ=0.1\""),
        )
        .arg(
            Arg::new("send")
                .value_name("command")
                .long("send")
                .action(ArgAction::Append)
                .requires("port")
                .help("Configuration command sent before decoding, for example \"CFG-RAWRATE 5\""),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print decoded content as JSON lines"),
        )
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_env("NVS_LOG")
        .init();

    let matches = cli().get_matches();
    let options: DecoderOptions = matches
        .get_one::<String>("options")
        .map(String::as_str)
        .unwrap_or_default()
        .parse()
        .context("invalid decoder options")?;
    let printer = Printer {
        json: matches.get_flag("json"),
    };
    let mut receiver = Receiver::new(options);

    if let Some(path) = matches.get_one::<String>("file") {
        let file = File::open(path).with_context(|| format!("failed to open \"{}\"", path))?;
        decode_file(&mut receiver, BufReader::new(file), &printer)
    } else if let Some(port) = matches.get_one::<String>("port") {
        decode_port(&mut receiver, port, &matches, &printer)
    } else {
        anyhow::bail!("either --file or --port is required")
    }
}

fn decode_file<R: Read>(receiver: &mut Receiver, mut reader: R, printer: &Printer) -> Result<()> {
    let mut frames = 0usize;
    loop {
        match receiver.input_file(&mut reader) {
            Ok(Status::EndOfInput) => break,
            Ok(status) => {
                frames += 1;
                printer.print(receiver.state(), status)?;
            },
            Err(nvs::ParserError::Io(e)) => return Err(e).context("read error"),
            Err(e) => warn!("{}", e),
        }
    }
    info!("{} frames decoded", frames);
    Ok(())
}

fn decode_port(
    receiver: &mut Receiver,
    name: &str,
    matches: &ArgMatches,
    printer: &Printer,
) -> Result<()> {
    let baud = matches.get_one::<u32>("baud").copied().unwrap_or(115_200);
    let mut port = serialport::new(name, baud)
        .parity(serialport::Parity::Odd)
        .timeout(Duration::from_millis(10))
        .open()
        .with_context(|| format!("failed to open \"{}\"", name))?;

    for text in matches.get_many::<String>("send").into_iter().flatten() {
        let bytes = gen_command(text);
        if bytes.is_empty() {
            anyhow::bail!("invalid command \"{}\"", text);
        }
        port.write_all(&bytes)
            .with_context(|| format!("failed to send \"{}\"", text))?;
        info!("sent {}", text);
    }

    info!("opened {} at {} baud, waiting for messages...", name, baud);
    let mut buf = [0u8; 4096];
    loop {
        let nbytes = match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => return Err(e).context("serial port read error"),
        };
        let mut it = receiver.consume(&buf[..nbytes]);
        while let Some(result) = it.next() {
            match result {
                Ok(status) => printer.print(it.state(), status)?,
                Err(e) => warn!("{}", e),
            }
        }
    }
}

struct Printer {
    json: bool,
}

impl Printer {
    fn emit<T: Serialize>(&self, kind: &str, value: &T) -> Result<()> {
        let value = serde_json::to_string(value)?;
        println!("{{\"{}\":{}}}", kind, value);
        Ok(())
    }

    fn print(&self, state: &ReceiverState, status: Status) -> Result<()> {
        if let Some(tag) = state.last_tag() {
            debug!("{} status={}", tag, status.code());
        }
        match status {
            Status::Observation => {
                if self.json {
                    self.emit("observations", &state.observations())?;
                } else if let Some(epoch) = state.last_epoch() {
                    let svs: Vec<String> =
                        state.observations().iter().map(|obs| obs.sv.to_string()).collect();
                    println!("obs {} n={} [{}]", epoch, svs.len(), svs.join(" "));
                }
            },
            Status::Ephemeris => {
                let Some(sv) = state.last_ephemeris() else {
                    return Ok(());
                };
                let nav = state.navigation();
                if let Some(eph) = nav.glonass_ephemerides.get(&sv) {
                    if self.json {
                        self.emit("glonass_ephemeris", eph)?;
                    } else {
                        println!("eph {} toe={} iode={}", sv, eph.toe, eph.iode);
                    }
                } else if let Some(eph) = nav.gps_ephemerides.get(&sv) {
                    if self.json {
                        self.emit("gps_ephemeris", eph)?;
                    } else {
                        println!("eph {} toe={} iode={}", sv, eph.toe, eph.iode);
                    }
                }
            },
            Status::Sbas => {
                if let Some(msg) = state.sbas() {
                    if self.json {
                        self.emit("sbas", msg)?;
                    } else {
                        println!(
                            "sbas prn={} type={} week={} tow={}",
                            msg.prn,
                            msg.message_type(),
                            msg.week,
                            msg.tow
                        );
                    }
                }
            },
            Status::Pvt => {
                if let Some(pvt) = state.pvt() {
                    if self.json {
                        self.emit("pvt", pvt)?;
                    } else {
                        println!(
                            "pvt {} lat={:.7} lon={:.7} h={:.3} flags={:?}",
                            pvt.epoch,
                            pvt.latitude.to_degrees(),
                            pvt.longitude.to_degrees(),
                            pvt.height,
                            pvt.flags
                        );
                    }
                }
            },
            Status::Almanac => {
                let nav = state.navigation();
                if self.json {
                    let gps: Vec<_> = nav.gps_almanacs.values().collect();
                    let glonass: Vec<_> = nav.glonass_almanacs.values().collect();
                    self.emit("gps_almanacs", &gps)?;
                    self.emit("glonass_almanacs", &glonass)?;
                } else {
                    println!(
                        "alm gps={} glonass={}",
                        nav.gps_almanacs.len(),
                        nav.glonass_almanacs.len()
                    );
                }
            },
            Status::IonUtc => {
                let nav = state.navigation();
                if self.json {
                    self.emit("ionosphere", &nav.ionosphere)?;
                    self.emit("utc", &nav.utc)?;
                } else {
                    println!("ion {:?} utc {:?}", nav.ionosphere, nav.utc);
                }
            },
            Status::NoMessage | Status::EndOfInput => {},
        }
        Ok(())
    }
}
