//! Sequence file parser.
//!
//! Layout: one board byte, then the body. The body starts with a
//! `binrw` header (magic, timer-B value, part count, comment offset,
//! part offsets); all offsets are relative to the body.

use arrayvec::ArrayVec;
use binrw::io::Cursor;
use binrw::{binread, BinRead};
use op_ir::{decode, Board, Command, ParsedTrack, MAX_COMMANDS_PER_TICK, MAX_PARTS};

use crate::FormatError;

/// Largest file accepted, matching the staging buffer.
pub const MAX_FILE_SIZE: usize = 0xFFFF;

#[binread]
#[derive(Debug)]
#[br(little, magic = b"OPSQ")]
struct Header {
    timer_b: u8,
    #[br(temp)]
    part_count: u8,
    comment_offset: u16,
    #[br(count = part_count)]
    part_offsets: Vec<u16>,
}

/// Load a sequence file from bytes.
pub fn load_track(data: &[u8]) -> Result<ParsedTrack, FormatError> {
    if data.len() > MAX_FILE_SIZE {
        return Err(FormatError::TooLarge(data.len()));
    }
    let (&board_byte, body) = data.split_first().ok_or(FormatError::UnexpectedEof)?;
    let board = Board::from_byte(board_byte).ok_or(FormatError::UnsupportedBoard(board_byte))?;

    let header = Header::read(&mut Cursor::new(body)).map_err(|e| {
        if e.is_eof() {
            FormatError::UnexpectedEof
        } else {
            FormatError::InvalidHeader
        }
    })?;

    let count = header.part_offsets.len();
    if count == 0 || count > board.max_parts() {
        return Err(FormatError::BadPartCount {
            count,
            max: board.max_parts(),
        });
    }

    let mut parts = ArrayVec::<u16, MAX_PARTS>::new();
    for (part, &offset) in header.part_offsets.iter().enumerate() {
        if offset as usize >= body.len() {
            return Err(FormatError::PartOutOfBounds {
                part,
                offset: offset as usize,
            });
        }
        validate_part(body, part, offset as usize)?;
        parts.push(offset);
    }

    let comment = match header.comment_offset {
        0 => None,
        offset => Some(read_comment(body, offset as usize)?),
    };

    ParsedTrack::new(data.to_vec(), board, header.timer_b, parts, comment)
        .ok_or(FormatError::UnexpectedEof)
}

/// Walk a part stream to its end marker, checking every command.
///
/// Also bounds every run of commands the driver decodes in one tick. A
/// run ends at a note or rest; the run ending at a looping end marker
/// carries on from the loop point up to the loop's first note or rest.
fn validate_part(body: &[u8], part: usize, start: usize) -> Result<(), FormatError> {
    let mut offset = start;
    let mut in_loop = false;
    let mut timed_in_loop = false;
    let mut run = 0;
    // commands from the loop point to its first timed command, inclusive
    let mut loop_lead = 0;
    let check_run = |run: usize, offset: usize| {
        if run > MAX_COMMANDS_PER_TICK {
            Err(FormatError::TooManyCommands { part, offset })
        } else {
            Ok(())
        }
    };

    loop {
        let (command, next) = decode(body, offset).map_err(|kind| FormatError::InvalidCommand {
            part,
            offset,
            kind,
        })?;
        run += 1;
        if in_loop && !timed_in_loop {
            loop_lead += 1;
        }

        match command {
            Command::LoopPoint if in_loop => return Err(FormatError::DuplicateLoopPoint { part }),
            Command::LoopPoint => in_loop = true,
            Command::End => {
                if in_loop && !timed_in_loop {
                    return Err(FormatError::EmptyLoop { part });
                }
                let wrapped = if in_loop { run + loop_lead } else { run };
                return check_run(wrapped, offset);
            }
            c if c.is_timed() => {
                check_run(run, offset)?;
                run = 0;
                timed_in_loop |= in_loop;
            }
            _ => {}
        }
        offset = next;
    }
}

fn read_comment(body: &[u8], offset: usize) -> Result<String, FormatError> {
    let text = body.get(offset..).ok_or(FormatError::UnterminatedComment)?;
    let end = text
        .iter()
        .position(|&b| b == 0)
        .ok_or(FormatError::UnterminatedComment)?;
    Ok(String::from_utf8_lossy(&text[..end]).into_owned())
}
