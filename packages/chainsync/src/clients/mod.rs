mod evm;
