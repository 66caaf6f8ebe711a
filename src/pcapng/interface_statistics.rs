use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;
use nom::{Err, IResult};
use rusticata_macros::newtype_enum;

use crate::endianness::{gen_u32, parse_u32};
use crate::error::{ErrorReporter, PcapError};

use super::option::{option_string, option_u64};
use super::time::{gen_timestamp, parse_timestamp};
use super::*;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct InterfaceStatisticsOptionCode(pub u16);

newtype_enum! {
impl debug InterfaceStatisticsOptionCode {
    EndOfOpt = 0,
    Comment = 1,
    StartTime = 2,
    EndTime = 3,
    InterfaceReceived = 4,
    InterfaceDrop = 5,
    FilterAccept = 6,
    SystemDrop = 7,
    DeliveredToUser = 8,
}
}

/// Options of an Interface Statistics Block
///
/// Counters are relative to the start of the capture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceStatisticsOptions {
    pub comment: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    /// Packets received from the physical interface
    pub interface_received: Option<u64>,
    /// Packets dropped by the interface due to lack of resources
    pub interface_drop: Option<u64>,
    pub filter_accept: Option<u64>,
    /// Packets dropped by the operating system
    pub system_drop: Option<u64>,
    pub delivered_to_user: Option<u64>,
}

impl OptionSchema for InterfaceStatisticsOptions {
    fn decode_option(&mut self, option: &PcapNGOption, reverse: bool) -> Result<bool, PcapError> {
        let value = option.value();
        match InterfaceStatisticsOptionCode(option.code) {
            InterfaceStatisticsOptionCode::Comment => {
                self.comment = Some(option_string("opt_comment", value)?)
            }
            InterfaceStatisticsOptionCode::StartTime => {
                self.start_time = Some(Timestamp::from_option("isb_starttime", value, reverse)?)
            }
            InterfaceStatisticsOptionCode::EndTime => {
                self.end_time = Some(Timestamp::from_option("isb_endtime", value, reverse)?)
            }
            InterfaceStatisticsOptionCode::InterfaceReceived => {
                self.interface_received = Some(option_u64("isb_ifrecv", value, reverse)?)
            }
            InterfaceStatisticsOptionCode::InterfaceDrop => {
                self.interface_drop = Some(option_u64("isb_ifdrop", value, reverse)?)
            }
            InterfaceStatisticsOptionCode::FilterAccept => {
                self.filter_accept = Some(option_u64("isb_filteraccept", value, reverse)?)
            }
            InterfaceStatisticsOptionCode::SystemDrop => {
                self.system_drop = Some(option_u64("isb_osdrop", value, reverse)?)
            }
            InterfaceStatisticsOptionCode::DeliveredToUser => {
                self.delivered_to_user = Some(option_u64("isb_usrdeliv", value, reverse)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn to_options(&self, reverse: bool) -> Vec<PcapNGOption<'_>> {
        type Code = InterfaceStatisticsOptionCode;
        let mut options = Vec::new();
        if let Some(ref comment) = self.comment {
            options.push(PcapNGOption::string(Code::Comment.0, comment));
        }
        if let Some(ts) = self.start_time {
            options.push(PcapNGOption::new(Code::StartTime.0, ts.to_option_value(reverse)));
        }
        if let Some(ts) = self.end_time {
            options.push(PcapNGOption::new(Code::EndTime.0, ts.to_option_value(reverse)));
        }
        let counters = [
            (Code::InterfaceReceived, self.interface_received),
            (Code::InterfaceDrop, self.interface_drop),
            (Code::FilterAccept, self.filter_accept),
            (Code::SystemDrop, self.system_drop),
            (Code::DeliveredToUser, self.delivered_to_user),
        ];
        for (code, counter) in counters.iter() {
            if let Some(count) = counter {
                options.push(PcapNGOption::from_u64(code.0, *count, reverse));
            }
        }
        options
    }
}

/// The Interface Statistics Block (ISB) contains the capture statistics for a given
/// interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceStatisticsBlock {
    pub interface_id: u32,
    pub timestamp: Timestamp,
    pub options: InterfaceStatisticsOptions,
}

impl PcapNGBlock for InterfaceStatisticsBlock {
    const BLOCK_TYPE: BlockType = BlockType::InterfaceStatistics;

    fn parse_body<'a>(
        i: &'a [u8],
        reverse: bool,
        errors: &mut ErrorReporter,
    ) -> IResult<&'a [u8], Self, PcapError> {
        let (i, interface_id) = parse_u32(reverse)(i)?;
        let (i, timestamp) = parse_timestamp(i, reverse)?;
        let (i, options) =
            InterfaceStatisticsOptions::parse_area(i, reverse, errors).map_err(Err::Error)?;
        let block = InterfaceStatisticsBlock {
            interface_id,
            timestamp,
            options,
        };
        Ok((i, block))
    }

    fn body_to_vec(&self, reverse: bool) -> Result<Vec<u8>, PcapError> {
        let mut v = gen_simple(
            tuple((
                gen_u32(self.interface_id, reverse),
                gen_timestamp(self.timestamp, reverse),
            )),
            Vec::with_capacity(64),
        )?;
        v.extend_from_slice(&self.options.encode(reverse)?);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const REVERSE_LE: bool = cfg!(target_endian = "big");

    // from the pcapng draft (section 4.6), isb_starttime and isb_endtime
    const ISB_BODY_LE: &[u8] = &hex!(
        "00 00 00 00 97 c3 04 00 aa 47 ca 64
         02 00 08 00 97 c3 04 00 7e 3b ca 64
         03 00 08 00 97 c3 04 00 aa 47 ca 64
         04 00 08 00 2c 00 00 00 00 00 00 00
         00 00 00 00"
    );

    #[test]
    fn decode_isb() {
        let (rem, isb) =
            InterfaceStatisticsBlock::parse_body(ISB_BODY_LE, REVERSE_LE, &mut ErrorReporter::fatal())
                .expect("parse");
        assert!(rem.is_empty());
        assert_eq!(isb.interface_id, 0);
        assert_eq!(isb.timestamp, Timestamp::new(1340954905, 298858));
        let start = isb.options.start_time.expect("start time");
        assert_eq!(start.seconds, 1340954905);
        assert_eq!(isb.options.end_time, Some(isb.timestamp));
        assert!(start < isb.timestamp);
        assert_eq!(isb.options.interface_received, Some(44));
        assert_eq!(isb.options.interface_drop, None);
        assert_eq!(
            &isb.body_to_vec(REVERSE_LE).expect("serialize")[..],
            ISB_BODY_LE
        );
    }

    #[test]
    fn isb_round_trip() {
        let isb = InterfaceStatisticsBlock {
            interface_id: 1,
            timestamp: Timestamp::new(1_432_723_900, 5),
            options: InterfaceStatisticsOptions {
                comment: Some("stats".to_string()),
                start_time: Some(Timestamp::new(1_432_723_816, 0)),
                end_time: Some(Timestamp::new(1_432_723_900, 5)),
                interface_received: Some(1000),
                interface_drop: Some(1),
                filter_accept: Some(998),
                system_drop: Some(0),
                delivered_to_user: Some(997),
            },
        };
        for &reverse in &[false, true] {
            let framed = isb.encode(reverse).expect("encode");
            let block = Block::decode(&framed, &mut ErrorReporter::fatal()).expect("decode");
            assert_eq!(block.associated_interface_id(), None);
            assert_eq!(block, Block::InterfaceStatistics(isb.clone()));
        }
    }
}
